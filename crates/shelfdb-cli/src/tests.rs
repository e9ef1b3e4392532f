use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["shelfdb", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shelfdb"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn run_without_pages_uses_config_default() {
    let cli = Cli::try_parse_from(["shelfdb", "run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run { pages: None })));
}

#[test]
fn run_with_pages_override() {
    let cli = Cli::try_parse_from(["shelfdb", "run", "--pages", "12"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run { pages: Some(12) })));
}

#[test]
fn run_rejects_zero_pages() {
    let result = Cli::try_parse_from(["shelfdb", "run", "--pages", "0"]);
    assert!(result.is_err(), "zero pages must be rejected");
}

#[test]
fn report_defaults_to_unfiltered_summary() {
    let cli = Cli::try_parse_from(["shelfdb", "report"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            ref ratings,
            ref availability,
            json: false,
        }) if ratings.is_empty() && availability.is_empty()
    ));
}

#[test]
fn report_collects_repeated_filters() {
    let cli = Cli::try_parse_from([
        "shelfdb",
        "report",
        "--rating",
        "3",
        "--rating",
        "5",
        "--availability",
        "In stock",
        "--json",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            ref ratings,
            ref availability,
            json: true,
        }) if *ratings == vec![3, 5] && *availability == vec!["In stock".to_owned()]
    ));
}

#[test]
fn report_rejects_rating_above_five() {
    let result = Cli::try_parse_from(["shelfdb", "report", "--rating", "6"]);
    assert!(result.is_err(), "rating 6 must be rejected");
}

#[test]
fn db_requires_subcommand() {
    let result = Cli::try_parse_from(["shelfdb", "db"]);
    assert!(result.is_err(), "db without subcommand should fail");
}
