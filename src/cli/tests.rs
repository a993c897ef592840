use super::*;
use clap::Parser;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }
}

use test_helpers::parse_args;

#[test]
fn analyze_takes_files_in_order_with_options() {
    let argv = [
        "tracelens",
        "analyze",
        "b.pdf",
        "a.pdf",
        "-i",
        "List failed logins",
        "--backend",
        "direct",
        "--html",
        "report.html",
        "--plain",
    ];
    match parse_args(&argv).command {
        Commands::Analyze {
            files,
            instruction,
            backend,
            html,
            plain,
        } => {
            assert_eq!(files, vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]);
            assert_eq!(instruction.as_deref(), Some("List failed logins"));
            assert_eq!(backend, Some(Backend::Direct));
            assert_eq!(html, Some(PathBuf::from("report.html")));
            assert!(plain);
        }
        _ => panic!("expected analyze subcommand for argv={argv:?}"),
    }
}

#[test]
fn analyze_requires_at_least_one_file() {
    assert!(Args::try_parse_from(["tracelens", "analyze"]).is_err());
}

#[test]
fn analyze_rejects_unknown_backend() {
    assert!(Args::try_parse_from(["tracelens", "analyze", "a.pdf", "-b", "ftp"]).is_err());
}

#[test]
fn chat_prompt_collects_trailing_words() {
    let argv = ["tracelens", "-m", "small", "chat", "what", "is", "-v", "?"];
    let args = parse_args(&argv);
    assert_eq!(args.model.as_deref(), Some("small"));
    match args.command {
        Commands::Chat { prompt, system, .. } => {
            assert_eq!(prompt, vec!["what", "is", "-v", "?"]);
            assert!(system.is_none());
        }
        _ => panic!("expected chat subcommand for argv={argv:?}"),
    }
}

#[test]
fn global_log_flag_works_after_subcommand() {
    let argv = ["tracelens", "chat", "--log", "chat.log", "-s", "Be terse"];
    let args = parse_args(&argv);
    assert_eq!(args.log.as_deref(), Some("chat.log"));
    match args.command {
        Commands::Chat { prompt, system, .. } => {
            assert!(prompt.is_empty());
            assert_eq!(system.as_deref(), Some("Be terse"));
        }
        _ => panic!("expected chat subcommand for argv={argv:?}"),
    }
}

#[test]
fn set_joins_multi_word_values() {
    let argv = ["tracelens", "set", "instruction", "List", "every", "alert"];
    match parse_args(&argv).command {
        Commands::Set { key, value } => {
            assert_eq!(key, "instruction");
            assert_eq!(value.join(" "), "List every alert");
        }
        _ => panic!("expected set subcommand for argv={argv:?}"),
    }
}

#[test]
fn auth_and_api_key_subcommands_parse() {
    assert!(matches!(
        parse_args(&["tracelens", "auth", "set"]).command,
        Commands::Auth {
            command: AuthCommands::Set { key: None }
        }
    ));
    assert!(matches!(
        parse_args(&["tracelens", "auth", "status"]).command,
        Commands::Auth {
            command: AuthCommands::Status
        }
    ));
    match parse_args(&["tracelens", "api-key", "set", "sk-new"]).command {
        Commands::ApiKey {
            command: ApiKeyCommands::Set { key },
        } => assert_eq!(key, "sk-new"),
        _ => panic!("expected api-key set"),
    }
    assert!(matches!(
        parse_args(&["tracelens", "config"]).command,
        Commands::Config
    ));
}
