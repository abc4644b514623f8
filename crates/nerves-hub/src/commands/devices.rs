//! Device command handlers.

use std::fmt::Write as _;

use serde_json::Value;
use tabled::Tabled;

use nerves_hub_api::{Device, NervesHubClient};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Render an optional string field the server may add to a device.
fn extra_str(device: &Device, field: &str) -> String {
    match device.extra.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".into(),
        Some(other) => other.to_string(),
    }
}

fn device_row(d: &Device) -> DeviceRow {
    DeviceRow {
        identifier: d.identifier.clone(),
        description: d.description().unwrap_or("-").to_string(),
        tags: util::join_tags(d.tags()),
        version: extra_str(d, "version"),
        status: extra_str(d, "status"),
    }
}

fn detail(d: &Device) -> String {
    let mut out = format!("Identifier:  {}\n", d.identifier);
    let _ = writeln!(
        out,
        "Description: {}",
        d.description().unwrap_or("-")
    );
    let _ = write!(out, "Tags:        {}", util::join_tags(d.tags()));
    for (key, value) in &d.extra {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = write!(out, "\n{key}: {rendered}");
    }
    out
}

pub async fn handle(
    client: &NervesHubClient,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = client.device_list().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                &devices.data,
                device_row,
                |d| d.identifier.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Create {
            identifier,
            description,
            tags,
        } => {
            // No --tag flags means an empty tag list on the server.
            let tags = (!tags.is_empty()).then_some(tags);
            let created = client
                .device_create(&identifier, description.as_deref(), tags.as_deref())
                .await?;
            let out = output::render_single(&global.output, &created, &created.data, detail, |d| {
                d.identifier.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Delete { identifier } => {
            if !util::confirm(
                "devices delete",
                &format!("Delete device '{identifier}'? This cannot be undone."),
                global.yes,
            )? {
                return Ok(());
            }
            let deleted = client.device_delete(&identifier).await?;
            if !global.quiet {
                if deleted {
                    eprintln!("Device deleted");
                } else {
                    eprintln!("Delete request accepted, but the server did not confirm removal");
                }
            }
            Ok(())
        }
    }
}
