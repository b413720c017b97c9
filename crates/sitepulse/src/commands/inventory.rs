//! `sites` and `elements`: inventory listing and export.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tabled::Tabled;

use sitepulse_core::{Session, Site};

use crate::cli::{ExportArgs, GlobalOpts, InventoryArgs, InventoryCommand, InventoryExportArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::report::{self, CsvWriter, SpreadsheetWriter, Table};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ElementRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Site ID")]
    site_id: String,
    #[tabled(rename = "Element ID")]
    element_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Version")]
    version: String,
}

impl From<&Site> for ElementRow {
    fn from(s: &Site) -> Self {
        Self {
            name: s.name.clone(),
            site_id: s.site_id.clone(),
            element_id: s.element_id.clone(),
            model: s.model_name.clone().unwrap_or_default(),
            serial: s.serial_number.clone().unwrap_or_default(),
            version: s.software_version.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    admin_state: String,
    #[tabled(rename = "Role")]
    role: String,
}

fn field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(report::cell_text)
        .unwrap_or_default()
}

impl From<&Map<String, Value>> for SiteRow {
    fn from(r: &Map<String, Value>) -> Self {
        Self {
            id: field(r, "id"),
            name: field(r, "name"),
            admin_state: field(r, "admin_state"),
            role: field(r, "element_cluster_role"),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_sites(
    args: InventoryArgs,
    mut ctx: Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = util::connect(&ctx, global).await?;
    let records: Vec<Map<String, Value>> = session
        .site_records()
        .await?
        .iter()
        .map(report::flatten_record)
        .collect();

    match args.command {
        InventoryCommand::List => {
            let out = output::render_list(
                &global.output,
                &records,
                |r| SiteRow::from(r),
                |r| field(r, "id"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        InventoryCommand::Export(args) if args.workbook => {
            let sites = session.sites().await?;
            export_workbook(&mut ctx, &args.export, &records, &sites, global)
        }
        InventoryCommand::Export(args) => {
            let table = Table::from_records(&records);
            export_table(&mut ctx, &args.export, "site_list.csv", &table, global)
        }
    }
}

pub async fn handle_elements(
    args: InventoryArgs,
    mut ctx: Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = util::connect(&ctx, global).await?;
    let sites = session.sites().await?;

    match args.command {
        InventoryCommand::List => {
            let out = output::render_list(
                &global.output,
                &sites,
                |s| ElementRow::from(s),
                |s| s.element_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        InventoryCommand::Export(args) => {
            export_elements(&mut ctx, &session, &args, &sites, global).await
        }
    }
}

async fn export_elements(
    ctx: &mut Context,
    session: &Session,
    args: &InventoryExportArgs,
    sites: &[Site],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.workbook {
        let records: Vec<Map<String, Value>> = session
            .site_records()
            .await?
            .iter()
            .map(report::flatten_record)
            .collect();
        export_workbook(ctx, &args.export, &records, sites, global)
    } else {
        let table = Table::from_records(&element_records(sites)?);
        export_table(ctx, &args.export, "element_list.csv", &table, global)
    }
}

fn element_records(sites: &[Site]) -> Result<Vec<Map<String, Value>>, CliError> {
    sites
        .iter()
        .map(|s| -> Result<Map<String, Value>, CliError> {
            match serde_json::to_value(s)? {
                Value::Object(map) => Ok(map),
                _ => Err(CliError::Internal("element did not serialize to an object".into())),
            }
        })
        .collect()
}

/// Sites and elements as two sheets of one `inventory` export.
fn export_workbook(
    ctx: &mut Context,
    export: &ExportArgs,
    site_records: &[Map<String, Value>],
    sites: &[Site],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut sheets = IndexMap::new();
    sheets.insert("sites".to_owned(), Table::from_records(site_records));
    sheets.insert("elements".to_owned(), Table::from_records(&element_records(sites)?));

    let dir = util::export_dir(export, ctx);
    let stem = util::export_name("inventory", export);
    let paths = CsvWriter.write_sheets(&dir, &stem, &sheets)?;
    util::remember_export_dir(ctx, &dir);
    if !global.quiet {
        for path in &paths {
            eprintln!("✓ Exported {}", path.display());
        }
    }
    Ok(())
}

fn export_table(
    ctx: &mut Context,
    export: &ExportArgs,
    name: &str,
    table: &Table,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dir = util::export_dir(export, ctx);
    let path = dir.join(util::export_name(name, export));
    CsvWriter.write_table(&path, table)?;
    util::remember_export_dir(ctx, &dir);
    if !global.quiet {
        eprintln!("✓ Exported {} rows to {}", table.len(), path.display());
    }
    Ok(())
}
