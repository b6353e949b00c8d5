//! reminder-call: deliver one medication reminder.
//!
//! Renders the reminder document and hands it inline to the Twilio
//! Calls API, optionally also emailing the reminder. Credentials come
//! from config.yaml, `TWILIO_*` / `EMAIL_*` environment variables, or a
//! `.env` file in the working directory.

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use twiml_reminder::call::TwilioCaller;
use twiml_reminder::config::Config;
use twiml_reminder::twiml::{self, ReminderRequest};
use twiml_reminder::{email, init_logging};

#[derive(Parser, Debug)]
#[command(name = "reminder-call", about = "Place a medication reminder call")]
struct Args {
    /// Medicine name
    #[arg(long)]
    name: Option<String>,

    /// Dosage, e.g. "500mg"
    #[arg(long)]
    dosage: Option<String>,

    /// Time of day, e.g. "8 PM"
    #[arg(long)]
    time: Option<String>,

    /// Number to call (overrides twilio.to_number)
    #[arg(long)]
    to: Option<String>,

    /// Also send the reminder by email
    #[arg(long)]
    email: bool,

    /// Skip the phone call (use with --email)
    #[arg(long)]
    no_call: bool,

    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the document instead of placing the call
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Failed to load .env: {e}");
        }
    }

    let request = ReminderRequest {
        name: args.name,
        dosage: args.dosage,
        time: args.time,
    };
    let doc = twiml::render(&request);

    if args.dry_run {
        println!("{doc}");
        if args.email {
            println!("\n{}", email::reminder_body(&request));
        }
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;

    // Channels are independent: a failed call does not suppress the email.
    let mut failed = false;

    if !args.no_call {
        let mut twilio = config.twilio;
        twilio.apply_env();
        let to = args.to.unwrap_or_else(|| twilio.to_number.clone());

        let result = match TwilioCaller::new(&twilio) {
            Ok(caller) => caller.place_call(&to, &doc).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(sid) => {
                info!("Reminder call queued: {sid}");
                println!("{sid}");
            }
            Err(e) => {
                warn!("Failed to place reminder call: {e}");
                failed = true;
            }
        }
    }

    if args.email {
        let mut email_config = config.email;
        email_config.apply_env();
        if let Err(e) = email::send_reminder(&email_config, &request).await {
            warn!("Failed to send reminder email: {e}");
            failed = true;
        }
    }

    if failed {
        return Err("reminder delivery failed".into());
    }
    Ok(())
}
