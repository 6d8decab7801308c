//! `x121-layout-inspect` -- inspect and administer saved panel layouts.
//!
//! Talks to the layout persistence service with the same client the engine
//! uses. Output is JSON on stdout; logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable               | Default                        |
//! |------------------------|--------------------------------|
//! | `LAYOUT_API_URL`       | `http://localhost:3000/api/v1` |
//! | `LAYOUT_API_TOKEN`     | unset                          |
//! | `REQUEST_TIMEOUT_SECS` | `30`                           |

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use x121_layout_client::{
    ClientConfig, CreateAdminPreset, HttpLayoutService, LayoutService, UpdateAdminPreset,
};
use x121_layout_core::defaults::{get_default_layout_for_role, modules};
use x121_layout_core::serializer;
use x121_layout_core::types::DbId;

/// Inspect and administer saved panel layouts
#[derive(Parser, Debug)]
#[command(name = "x121-layout-inspect")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the current user's saved layouts
    List,
    /// Decode one saved layout and report dropped panels
    Show {
        id: DbId,
        /// Keep panels whose view module is unknown
        #[arg(long)]
        strict: bool,
        /// Extra view module keys to treat as registered
        #[arg(long = "module")]
        modules: Vec<String>,
    },
    /// Print the built-in default layout for a role
    Defaults { role: String },
    /// List admin layout presets
    Presets,
    /// Publish a saved layout as an admin preset, optionally as a role default
    Promote {
        layout_id: DbId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Clear the role assignment of an admin preset
    Unassign { preset_id: DbId },
    /// Delete an admin preset
    DeletePreset { preset_id: DbId },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "x121_layout_engine=info,x121_layout_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::List => print_json(&connect()?.list_layouts().await?),
        Command::Show {
            id,
            strict,
            modules: extra,
        } => {
            let record = connect()?
                .get_layout(id)
                .await
                .with_context(|| format!("Failed to fetch layout {id}"))?;
            let mut catalog: Vec<String> = modules::ALL.iter().map(|k| k.to_string()).collect();
            catalog.extend(extra);
            let decoded = serializer::decode_stored(&record.layout_json, catalog.as_slice(), strict);
            print_json(&serde_json::json!({
                "id": record.id,
                "layout_name": record.layout_name,
                "is_default": record.is_default,
                "is_shared": record.is_shared,
                "document_valid": decoded.document_valid,
                "panels": decoded.panels,
                "dropped": decoded.dropped,
            }))
        }
        Command::Defaults { role } => print_json(&get_default_layout_for_role(&role)),
        Command::Presets => print_json(&connect()?.list_admin_presets().await?),
        Command::Promote {
            layout_id,
            name,
            role,
        } => {
            let service = connect()?;
            let record = service
                .get_layout(layout_id)
                .await
                .with_context(|| format!("Failed to fetch layout {layout_id}"))?;
            let preset = service
                .create_admin_preset(&CreateAdminPreset {
                    name: name.unwrap_or(record.layout_name),
                    role_default_for: role,
                    layout_json: record.layout_json,
                })
                .await?;
            tracing::info!(preset_id = preset.id, layout_id, "Layout promoted to admin preset");
            print_json(&preset)
        }
        Command::Unassign { preset_id } => {
            let preset = connect()?
                .update_admin_preset(
                    preset_id,
                    &UpdateAdminPreset {
                        role_default_for: Some(None),
                        ..Default::default()
                    },
                )
                .await?;
            print_json(&preset)
        }
        Command::DeletePreset { preset_id } => {
            connect()?.delete_admin_preset(preset_id).await?;
            tracing::info!(preset_id, "Admin preset deleted");
            Ok(())
        }
    }
}

fn connect() -> anyhow::Result<HttpLayoutService> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(api_url = %config.api_url, "Using layout service");
    Ok(HttpLayoutService::new(&config)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
