//! Plain-text tables for terminal output.

use std::fmt::Write;

use assetdesk_core::models::{
    Asset, DashboardSummary, Division, Maintenance, Office, PendingAction, User,
};
use assetdesk_core::utils::{format_date, format_money, format_optional, truncate_string};

/// Column widths for the asset table.
const NAME_WIDTH: usize = 28;
const NUMBER_WIDTH: usize = 22;

pub fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let rows = [
        ("Total assets", summary.total_assets),
        ("Inactive", summary.inactive_assets),
        ("Need troubleshooting", summary.need_troubleshooting),
        ("Healthy", summary.healthy_assets()),
        ("Divisions", summary.divisions),
        ("Maintenance records", summary.maintenance_records),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{:<22} {:>6}", label, value);
    }

    let stats = &summary.asset_stats;
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<22} {:>6}", "Updated (awaiting)", stats.updated_assets);
    let _ = writeln!(out, "{:<22} {:>6}", "Pending approval", stats.pending_approval_assets);

    let categories = summary.categories_by_count();
    if !categories.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "By category:");
        for (category, count) in categories {
            let _ = writeln!(out, "  {:<20} {:>6}", category, count);
        }
    }
    out
}

pub fn render_assets(assets: &[Asset]) -> String {
    if assets.is_empty() {
        return "No assets.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<name$}  {:<num$}  {:<18}  {:<17}  {:>12}",
        "ID",
        "NAME",
        "NUMBER",
        "CATEGORY",
        "STATUS",
        "COST",
        name = NAME_WIDTH,
        num = NUMBER_WIDTH,
    );
    for asset in assets {
        let mut status = asset.asset_status.label().to_string();
        if asset.awaiting_approval() {
            status.push('*');
        }
        let _ = writeln!(
            out,
            "{:>5}  {:<name$}  {:<num$}  {:<18}  {:<17}  {:>12}",
            asset.id,
            truncate_string(&asset.name, NAME_WIDTH),
            truncate_string(&asset.asset_number, NUMBER_WIDTH),
            asset.category.label(),
            status,
            format_money(asset.cost as f64),
            name = NAME_WIDTH,
            num = NUMBER_WIDTH,
        );
    }
    if assets.iter().any(Asset::awaiting_approval) {
        let _ = writeln!(out, "\n* awaiting admin approval");
    }
    out
}

pub fn render_offices(offices: &[Office]) -> String {
    let mut out = String::new();
    for office in offices {
        let _ = writeln!(out, "{:>5}  {:<30}  {}", office.id, office.name, office.location);
    }
    out
}

pub fn render_divisions(divisions: &[Division]) -> String {
    let mut out = String::new();
    for division in divisions {
        let _ = writeln!(
            out,
            "{:>5}  {:<40}  {}",
            division.id,
            truncate_string(&division.display_name(), 40),
            division.head_of_division
        );
    }
    out
}

pub fn render_maintenances(records: &[Maintenance]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{:>5}  {:<12}  {:<24}  {:>10}  {}",
            record.id,
            format_date(record.day()),
            truncate_string(&record.asset.name, 24),
            record.cost_display(),
            truncate_string(&record.details, 50)
        );
    }
    out
}

pub fn render_pending_actions(actions: &[PendingAction]) -> String {
    if actions.is_empty() {
        return "No pending actions.\n".to_string();
    }
    let mut out = String::new();
    for action in actions {
        let _ = writeln!(
            out,
            "{:>5}  {:<7}  {:<9}  {:<12}  {}",
            action.id,
            action.action.label(),
            action.status,
            format_date(action.created_at.as_deref().unwrap_or("")),
            truncate_string(&format_optional(&action.description, "-"), 50)
        );
    }
    out
}

pub fn render_users(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        let role = if user.is_admin() { "admin" } else { "staff" };
        let _ = writeln!(
            out,
            "{:>5}  {:<16}  {:<24}  {:<6}  {}",
            user.id,
            truncate_string(&user.username, 16),
            truncate_string(&user.full_name(), 24),
            role,
            format_optional(&Some(user.email.clone()), "-")
        );
    }
    out
}
