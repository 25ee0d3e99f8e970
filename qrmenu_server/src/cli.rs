use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "QRM_HOST",
        "QRM_PORT",
        "QRM_DATABASE_URL",
        "QRM_SECURE_COOKIES",
        "QRM_BOARD_ORDER_LIMIT",
        "QRM_CHANGE_FEED_CAPACITY",
        "QRM_EVENT_BUFFER_SIZE",
        "QRM_DB_MAX_CONNECTIONS",
        "QRM_RUN_MIGRATIONS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let jwt_secret = if env::var("QRM_JWT_SECRET").is_ok() { "Set (hidden)" } else { "Not set" };
    println!("  {:<35} {jwt_secret:<15}", "QRM_JWT_SECRET");
}
