mod change_feed;
mod channel;
mod event_types;
mod hooks;

pub use change_feed::{
    ChangeEvent,
    ChangeFeed,
    ChangeFilter,
    ChangeKind,
    ColumnFilter,
    Notification,
    RowChange,
    Subscription,
    Table,
};
pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
