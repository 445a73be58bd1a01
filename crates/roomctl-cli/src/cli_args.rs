use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

fn parse_bool_flag(value: &str) -> Result<bool, String> {
    roomctl_core::parse_bool_cell(value).map_err(|error| error.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "roomctl",
    about = "Bulk room-configuration tool for a chat platform's admin API",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "ROOMCTL_CONFIG",
        default_value = "roomctl.toml",
        help = "TOML configuration file with the API endpoint and session token"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Modify a single room.
    Single(SingleArgs),
    /// Modify all modifiable rooms matching the scope/privacy flags.
    All(AllArgs),
    /// Export rooms to CSV, or update rooms from a CSV file.
    Csv(CsvArgs),
}

#[derive(Debug, Default, Args)]
/// Settings valid in every mode. Unset flags leave the setting unchanged.
pub struct CommonSettingsArgs {
    #[arg(
        long = "members-can-invite",
        value_parser = parse_bool_flag,
        help = "If true, any member can add room members; if false, only owners can"
    )]
    pub members_can_invite: Option<bool>,

    #[arg(
        long,
        value_parser = parse_bool_flag,
        help = "If true, the room is searchable by anyone; if false, only by members"
    )]
    pub discoverable: Option<bool>,

    #[arg(
        long = "copy-protected",
        value_parser = parse_bool_flag,
        help = "Disable copying content out of the room. Can only be switched on; once set it cannot be cleared"
    )]
    pub copy_protected: Option<bool>,

    #[arg(
        long = "view-history",
        value_parser = parse_bool_flag,
        help = "If true, new members can view the room's chat history"
    )]
    pub view_history: Option<bool>,
}

#[derive(Debug, Default, Args)]
/// Settings only meaningful for a single room.
pub struct SingleOnlySettingsArgs {
    #[arg(long, help = "Room name")]
    pub name: Option<String>,

    #[arg(long, help = "Room description. Pass \"\" to clear it")]
    pub description: Option<String>,

    #[arg(
        long = "pinned-message-id",
        help = "Message id to pin in the room. Pass \"\" to unpin"
    )]
    pub pinned_message_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct SingleArgs {
    #[arg(short = 's', long, help = "Stream id of the room to modify")]
    pub stream: String,

    #[command(flatten)]
    pub settings: CommonSettingsArgs,

    #[command(flatten)]
    pub single_settings: SingleOnlySettingsArgs,

    #[arg(
        long = "no-pre-check",
        help = "Apply the update even when current settings already match"
    )]
    pub no_pre_check: bool,
}

#[derive(Debug, Default, Args)]
/// Scope/privacy selection. Passing both flags of a pair selects both, the
/// same as passing neither.
pub struct ScopeFilterArgs {
    #[arg(long, help = "Only rooms whose membership scope is internal")]
    pub internal: bool,

    #[arg(long, help = "Only rooms whose membership scope is external")]
    pub external: bool,

    #[arg(long, help = "Only public rooms")]
    pub public: bool,

    #[arg(long, help = "Only private rooms")]
    pub private: bool,
}

#[derive(Debug, Default, Args)]
/// Origin/status selection, only meaningful for CSV exports.
pub struct OriginStatusFilterArgs {
    #[arg(long = "internal-origin", help = "Only rooms created by an internal user")]
    pub internal_origin: bool,

    #[arg(long = "external-origin", help = "Only rooms created by an external user")]
    pub external_origin: bool,

    #[arg(long, help = "Only active rooms")]
    pub active: bool,

    #[arg(long, help = "Only inactive rooms")]
    pub inactive: bool,
}

#[derive(Debug, Args)]
pub struct AllArgs {
    #[command(flatten)]
    pub settings: CommonSettingsArgs,

    #[command(flatten)]
    pub filter: ScopeFilterArgs,

    #[arg(
        long = "no-pre-check",
        help = "Apply updates even when current settings already match"
    )]
    pub no_pre_check: bool,
}

#[derive(Debug, Args)]
pub struct CsvArgs {
    #[arg(
        short = 'l',
        long,
        conflicts_with_all = ["list_all", "input"],
        help = "Export all modifiable rooms (active, internal origin) to CSV"
    )]
    pub list: bool,

    #[arg(
        long = "list-all",
        conflicts_with = "input",
        help = "Export all rooms matching the filter flags, modifiable or not"
    )]
    pub list_all: bool,

    #[arg(
        short = 'i',
        long,
        help = "CSV file of rooms to update; a directory resolves to input.csv inside it"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Output CSV path; a directory resolves to a timestamped file inside it. Update runs only write per-row results when this is set"
    )]
    pub output: Option<PathBuf>,

    #[arg(short = 'x', long, help = "Include non-modifiable columns in exports")]
    pub extended: bool,

    #[command(flatten)]
    pub settings: CommonSettingsArgs,

    #[command(flatten)]
    pub filter: ScopeFilterArgs,

    #[command(flatten)]
    pub origin_status: OriginStatusFilterArgs,

    #[arg(
        long = "no-pre-check",
        help = "Apply updates even when current settings already match"
    )]
    pub no_pre_check: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn unit_single_parses_settings_flags() {
        let cli = Cli::try_parse_from([
            "roomctl",
            "single",
            "--stream",
            "abc",
            "--members-can-invite",
            "false",
            "--description",
            "\"\"",
        ])
        .expect("parse");
        match cli.command {
            Command::Single(args) => {
                assert_eq!(args.stream, "abc");
                assert_eq!(args.settings.members_can_invite, Some(false));
                assert_eq!(args.single_settings.description.as_deref(), Some("\"\""));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unit_bool_flags_accept_csv_spellings() {
        let cli = Cli::try_parse_from([
            "roomctl",
            "all",
            "--discoverable",
            "YES",
            "--view-history",
            "0",
        ])
        .expect("parse");
        match cli.command {
            Command::All(args) => {
                assert_eq!(args.settings.discoverable, Some(true));
                assert_eq!(args.settings.view_history, Some(false));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn regression_csv_list_and_input_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "roomctl", "csv", "--list", "--input", "rooms.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unit_bad_boolean_flag_is_rejected() {
        let result = Cli::try_parse_from([
            "roomctl", "single", "--stream", "abc", "--discoverable", "maybe",
        ]);
        assert!(result.is_err());
    }
}
