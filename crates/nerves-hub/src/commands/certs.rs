//! Device certificate command handlers.

use chrono::{DateTime, Utc};
use tabled::Tabled;

use nerves_hub_api::{DeviceCertificate, NervesHubClient};

use crate::cli::{CertsArgs, CertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CertRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Not Before")]
    not_before: String,
    #[tabled(rename = "Not After")]
    not_after: String,
    #[tabled(rename = "Valid")]
    valid: &'static str,
}

/// Normalized UTC time, or the server's text when it cannot be parsed.
fn fmt_time(parsed: Option<DateTime<Utc>>, raw: &str) -> String {
    parsed.map_or_else(
        || raw.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn cert_row(c: &DeviceCertificate, now: DateTime<Utc>) -> CertRow {
    CertRow {
        serial: c.serial.clone(),
        not_before: fmt_time(c.not_before_utc(), &c.not_before),
        not_after: fmt_time(c.not_after_utc(), &c.not_after),
        valid: if c.is_valid_at(now) { "yes" } else { "no" },
    }
}

fn detail(c: &DeviceCertificate) -> String {
    format!(
        "Serial:     {}\nNot Before: {}\nNot After:  {}",
        c.serial,
        fmt_time(c.not_before_utc(), &c.not_before),
        fmt_time(c.not_after_utc(), &c.not_after)
    )
}

pub async fn handle(
    client: &NervesHubClient,
    args: CertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CertsCommand::List { identifier } => {
            let certs = client.device_cert_list(&identifier).await?;
            let now = Utc::now();
            let out = output::render_list(
                &global.output,
                &certs,
                &certs.data,
                |c| cert_row(c, now),
                |c| c.serial.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CertsCommand::Create { identifier, cert } => {
            let pem = std::fs::read(&cert)?;
            let created = client.device_cert_create(&identifier, &pem).await?;
            let out = output::render_single(&global.output, &created, &created.data, detail, |c| {
                c.serial.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
