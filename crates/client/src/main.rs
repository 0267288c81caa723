//! TSM gateway command-line client.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tsm_client::{
    default_config_path, BarcodeRequest, CardType, Config, OpenAccount, PayType, Sex, TsmClient,
    CAMPUS_CARD_PAY_ACC,
};

/// TSM gateway client - call campus-card gateway methods from the shell.
#[derive(Parser, Debug)]
#[command(name = "tsm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Obtain an access token
    Token,

    /// Open a cardholder account
    OpenAccount {
        /// Access token (fetched first when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Student or staff number
        #[arg(long)]
        sno: String,

        /// Cardholder name
        #[arg(long)]
        name: String,

        /// Sex: 1/male, 2/female, 9/unknown
        #[arg(long, default_value = "9")]
        sex: Sex,

        /// National ID number
        #[arg(long, default_value = "")]
        id_no: String,

        /// Phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// School code
        #[arg(long, default_value = "")]
        school_code: String,

        /// Department code
        #[arg(long, default_value = "")]
        dept_code: String,

        /// Birth date (YYYYMMDD)
        #[arg(long, default_value = " ")]
        born: String,

        /// Identity category code
        #[arg(long, default_value = "")]
        pid_code: String,

        /// Email address
        #[arg(long, default_value = "")]
        email: String,

        /// Enrolment date (YYYYMMDD)
        #[arg(long, default_value = "")]
        in_date: String,

        /// Expiry date (YYYYMMDD)
        #[arg(long, default_value = "")]
        exp_date: String,

        /// Card type: 800/permanent, 801/temporary
        #[arg(long, default_value = "800")]
        card_type: CardType,

        /// Base64 photo
        #[arg(long, default_value = "")]
        photo_image: String,
    },

    /// Generate a payment barcode
    Barcode {
        /// Access token (fetched first when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Campus-card account
        #[arg(long)]
        account: String,

        /// Pay type: 1/campus-card, 2/bound-bank-card, 3/custom-bank-card
        #[arg(long, default_value = "1")]
        pay_type: PayType,

        /// Bank card number (required for custom-bank-card payments)
        #[arg(long)]
        pay_acc: Option<String>,
    },

    /// Unfreeze a card
    Unfreeze {
        /// Access token (fetched first when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Campus-card account number
        #[arg(long)]
        account: i64,
    },

    /// Send a raw JSON payload and print the decrypted reply
    Call {
        /// Access token (fetched first when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Gateway method name
        #[arg(long)]
        method: String,

        /// Business JSON payload
        #[arg(long)]
        json: String,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Write a template configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration with secrets redacted
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // Load configuration
    let mut config = Config::load(&config_path)?;

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.log_level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Using config file: {:?}", config_path);

    match cli.command {
        // Config commands work on incomplete configurations
        Commands::Config(cmd) => run_config_command(&cmd, &config, &config_path)?,
        Commands::Token => {
            let client = connect(&config)?;
            let token = client.get_access_token().await?;
            println!("access_token: {}", token.access_token);
            println!("expires_in:   {}", token.expires_in);
        }
        Commands::OpenAccount {
            token,
            sno,
            name,
            sex,
            id_no,
            phone,
            school_code,
            dept_code,
            born,
            pid_code,
            email,
            in_date,
            exp_date,
            card_type,
            photo_image,
        } => {
            let client = connect(&config)?;
            let token = resolve_token(&client, token).await?;
            let holder = OpenAccount {
                sno,
                name,
                sex,
                id_no,
                phone,
                school_code,
                dept_code,
                born,
                pid_code,
                email,
                in_date,
                exp_date,
                card_type,
                photo_image,
            };
            let opened = client.open_account(&token, &holder).await?;
            println!("sno:     {}", opened.sno);
            println!("account: {}", opened.account);
        }
        Commands::Barcode {
            token,
            account,
            pay_type,
            pay_acc,
        } => {
            let request = barcode_request(account, pay_type, pay_acc)?;
            let client = connect(&config)?;
            let token = resolve_token(&client, token).await?;
            let barcode = client.get_barcode(&token, &request).await?;
            println!("barcode: {}", barcode.barcode);
            println!("expires: {}", barcode.expires);
        }
        Commands::Unfreeze { token, account } => {
            let client = connect(&config)?;
            let token = resolve_token(&client, token).await?;
            client.unfreeze_card(&token, account).await?;
            println!("Card {} unfrozen", account);
        }
        Commands::Call {
            token,
            method,
            json,
        } => {
            serde_json::from_str::<serde_json::Value>(&json)
                .map_err(|e| anyhow::anyhow!("--json is not valid JSON: {}", e))?;
            let client = connect(&config)?;
            let token = resolve_token(&client, token).await?;
            let reply = client.send(&token, &json, &method).await?;
            println!("{}", reply.payload);
        }
    }

    Ok(())
}

/// Validates the configuration and builds the gateway client.
fn connect(config: &Config) -> anyhow::Result<TsmClient> {
    let client = TsmClient::from_config(config)?;
    tracing::info!("Using gateway {}", client.gateway_url());
    Ok(client)
}

fn run_config_command(
    cmd: &ConfigCommands,
    config: &Config,
    config_path: &Path,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::template().save(config_path)?;
            println!("Wrote template configuration to {}", config_path.display());
        }
        ConfigCommands::Show => {
            println!("# {}", config_path.display());
            print!("{}", config.redacted().to_toml()?);
            if let Err(e) = config.validate() {
                eprintln!("Warning: configuration is incomplete: {}", e);
            }
        }
    }
    Ok(())
}

/// Uses `token` when given, otherwise requests a fresh one.
async fn resolve_token(client: &TsmClient, token: Option<String>) -> anyhow::Result<String> {
    match token {
        Some(token) => Ok(token),
        None => {
            tracing::info!("No --token given, requesting one");
            Ok(client.get_access_token().await?.access_token)
        }
    }
}

fn barcode_request(
    account: String,
    pay_type: PayType,
    pay_acc: Option<String>,
) -> anyhow::Result<BarcodeRequest> {
    match (pay_type, pay_acc) {
        (PayType::CampusCard, None) => Ok(BarcodeRequest::campus_card(account)),
        (PayType::CampusCard, Some(acc)) if acc != CAMPUS_CARD_PAY_ACC => {
            anyhow::bail!("--pay-acc is not used with campus-card payments")
        }
        (PayType::CampusCard, Some(_)) => Ok(BarcodeRequest::campus_card(account)),
        (PayType::BoundBankCard, None) => Ok(BarcodeRequest::bound_bank_card(account)),
        (PayType::CustomBankCard, None) => {
            anyhow::bail!("--pay-acc is required for custom-bank-card payments")
        }
        (pay_type, Some(acc)) => Ok(BarcodeRequest::bank_card(account, pay_type, acc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_token_command() {
        let cli = Cli::try_parse_from(["tsm", "token"]).unwrap();
        assert!(matches!(cli.command, Commands::Token));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["tsm", "token", "--verbose", "--config", "/tmp/tsm.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/tsm.toml")));
    }

    #[test]
    fn test_open_account_defaults() {
        let cli =
            Cli::try_parse_from(["tsm", "open-account", "--sno", "2024001", "--name", "Li Lei"])
                .unwrap();
        match cli.command {
            Commands::OpenAccount {
                token,
                sex,
                born,
                card_type,
                email,
                ..
            } => {
                assert!(token.is_none());
                assert_eq!(sex, Sex::Unknown);
                assert_eq!(born, " ");
                assert_eq!(card_type, CardType::Permanent);
                assert_eq!(email, "");
            }
            _ => panic!("Expected OpenAccount command"),
        }
    }

    #[test]
    fn test_open_account_typed_values() {
        let cli = Cli::try_parse_from([
            "tsm",
            "open-account",
            "--sno",
            "2024001",
            "--name",
            "Li Lei",
            "--sex",
            "female",
            "--card-type",
            "801",
        ])
        .unwrap();
        match cli.command {
            Commands::OpenAccount { sex, card_type, .. } => {
                assert_eq!(sex, Sex::Female);
                assert_eq!(card_type, CardType::Temporary);
            }
            _ => panic!("Expected OpenAccount command"),
        }
    }

    #[test]
    fn test_open_account_invalid_sex() {
        let result = Cli::try_parse_from([
            "tsm", "open-account", "--sno", "1", "--name", "x", "--sex", "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_barcode_command() {
        let cli = Cli::try_parse_from(["tsm", "barcode", "--token", "tok", "--account", "100234"])
            .unwrap();
        match cli.command {
            Commands::Barcode {
                token,
                account,
                pay_type,
                pay_acc,
            } => {
                assert_eq!(token.as_deref(), Some("tok"));
                assert_eq!(account, "100234");
                assert_eq!(pay_type, PayType::CampusCard);
                assert!(pay_acc.is_none());
            }
            _ => panic!("Expected Barcode command"),
        }
    }

    #[test]
    fn test_unfreeze_requires_numeric_account() {
        assert!(Cli::try_parse_from(["tsm", "unfreeze", "--account", "abc"]).is_err());

        let cli = Cli::try_parse_from(["tsm", "unfreeze", "--account", "100234"]).unwrap();
        assert!(matches!(cli.command, Commands::Unfreeze { account: 100234, .. }));
    }

    #[test]
    fn test_call_command() {
        let cli = Cli::try_parse_from([
            "tsm",
            "call",
            "--method",
            "synjones.onecard.barcode.get",
            "--json",
            "{}",
        ])
        .unwrap();
        match cli.command {
            Commands::Call { method, json, .. } => {
                assert_eq!(method, "synjones.onecard.barcode.get");
                assert_eq!(json, "{}");
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["tsm", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Init { force: true })
        ));

        let cli = Cli::try_parse_from(["tsm", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show)));
    }

    #[test]
    fn test_barcode_request_campus_card() {
        let request = barcode_request("100234".to_string(), PayType::CampusCard, None).unwrap();
        assert_eq!(request.pay_acc, CAMPUS_CARD_PAY_ACC);

        let request = barcode_request(
            "100234".to_string(),
            PayType::CampusCard,
            Some("###".to_string()),
        )
        .unwrap();
        assert_eq!(request.pay_acc, CAMPUS_CARD_PAY_ACC);

        assert!(barcode_request(
            "100234".to_string(),
            PayType::CampusCard,
            Some("6222".to_string())
        )
        .is_err());
    }

    #[test]
    fn test_barcode_request_bank_card() {
        let request = barcode_request("100234".to_string(), PayType::BoundBankCard, None).unwrap();
        assert_eq!(request.pay_type, PayType::BoundBankCard);
        assert_eq!(request.pay_acc, "");

        assert!(barcode_request("100234".to_string(), PayType::CustomBankCard, None).is_err());

        let request = barcode_request(
            "100234".to_string(),
            PayType::CustomBankCard,
            Some("6222020000000000".to_string()),
        )
        .unwrap();
        assert_eq!(request.pay_type, PayType::CustomBankCard);
        assert_eq!(request.pay_acc, "6222020000000000");
    }
}
