use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::analysis::Report;
use crate::commands::{
    admin_commands, analysis_commands, menu_commands, order_commands, recommend_commands,
};
use crate::config::{DB_PATH_ENV, ORDERS_PATH_ENV};
use crate::error::AppError;
use crate::models::cocktail::{Cocktail, CocktailInfo, CocktailUpdate};
use crate::models::order::{parse_order_timestamp, CartItem, OrderEntry, ORDER_TIMESTAMP_FORMAT};
use crate::services::recommendation_service::DEFAULT_NAME_SIMILARITY_THRESHOLD;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "ktail", version)]
#[command(about = "Cocktail bar menu, recommendations, orders and sales analytics")]
pub struct Cli {
    /// Catalog database file
    #[arg(long, global = true, env = DB_PATH_ENV)]
    pub db: Option<PathBuf>,
    /// Order log CSV file
    #[arg(long, global = true, env = ORDERS_PATH_ENV)]
    pub orders: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the menu catalog
    Menu {
        #[command(subcommand)]
        action: MenuCommand,
    },
    /// Suggest cocktails from free text (ingredients, flavours, names)
    Recommend {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of suggestions
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        top: i64,
    },
    /// Find a cocktail by exact or partial name
    Lookup { name: String },
    /// Rank cocktail names by similarity to a possibly misspelled query
    Fuzzy {
        query: String,
        #[arg(long, default_value_t = DEFAULT_NAME_SIMILARITY_THRESHOLD)]
        threshold: f64,
    },
    /// Record an order
    Order {
        name: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Special request, e.g. "less sugar"
        #[arg(long)]
        request: Option<String>,
        /// Order time as "YYYY-MM-DD HH:MM:SS" (defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,
    },
    /// Record every line of a cart as orders sharing one timestamp
    Checkout {
        /// Cart lines as NAME=QTY (a bare NAME means one)
        #[arg(required = true, num_args = 1..)]
        items: Vec<CartItem>,
        #[arg(long)]
        request: Option<String>,
    },
    /// Print the order log
    Orders,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Run sales reports (all of them when none are named)
    Analyze {
        /// Report ids or numbers, see `ktail reports`
        reports: Vec<Report>,
        #[arg(long, conflicts_with = "reports")]
        all: bool,
    },
    /// List the available reports
    Reports,
}

#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    /// Show every cocktail on the menu
    List,
    /// Filter the menu by name
    Search { keyword: String },
    /// Full details of one cocktail
    Show { name: String },
    /// Add a cocktail
    Add {
        name: String,
        #[command(flatten)]
        fields: CocktailFields,
    },
    /// Change fields of an existing cocktail
    Update {
        name: String,
        #[command(flatten)]
        fields: CocktailFields,
    },
    /// Remove a cocktail
    Delete { name: String },
    /// Catalog completeness and price statistics
    Stats,
    /// Cocktails priced within a range, inclusive
    PriceRange {
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
    },
    /// Load or refresh the menu from a CSV export
    Import { path: PathBuf },
}

#[derive(Debug, Clone, Default, Args)]
pub struct CocktailFields {
    #[arg(long)]
    pub ingredients: Option<String>,
    #[arg(long)]
    pub garnish: Option<String>,
    #[arg(long)]
    pub glassware: Option<String>,
    #[arg(long)]
    pub preparation: Option<String>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub note: Option<String>,
}

impl CocktailFields {
    fn into_cocktail(self, name: String) -> Cocktail {
        Cocktail {
            name: name.trim().to_string(),
            ingredients: self.ingredients,
            garnish: self.garnish,
            glassware: self.glassware,
            preparation: self.preparation,
            price: self.price,
            note: self.note,
        }
    }

    fn into_update(self) -> CocktailUpdate {
        CocktailUpdate {
            ingredients: self.ingredients,
            garnish: self.garnish,
            glassware: self.glassware,
            preparation: self.preparation,
            price: self.price,
            note: self.note,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    Add {
        name: String,
        #[arg(long, env = "KTAIL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to "root"
        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        name: String,
    },
    List,
    /// Check a name and password; exits non-zero when they do not match
    Verify {
        name: String,
        #[arg(long, env = "KTAIL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    parse_order_timestamp(value)
        .ok_or_else(|| format!("expected \"YYYY-MM-DD HH:MM:SS\", got '{value}'"))
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), AppError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let rendered = text(value);
            print!("{rendered}");
            if !rendered.is_empty() && !rendered.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }

    fn message(&self, text: &str) -> Result<(), AppError> {
        self.emit(&serde_json::json!({ "message": text }), |_| text.to_string())
    }
}

pub fn execute(command: Command, state: &AppState, json: bool) -> Result<ExitCode, AppError> {
    let out = Output { json };

    match command {
        Command::Menu { action } => run_menu(action, state, &out)?,
        Command::Recommend { query, top } => {
            let query = query.join(" ");
            let results = recommend_commands::recommend(state, &query, top)?;
            out.emit(&results, |results| {
                if results.is_empty() {
                    return format!("No cocktails match '{query}'.");
                }
                let mut text = String::new();
                for (rank, rec) in results.iter().enumerate() {
                    let _ = writeln!(
                        text,
                        "{}. {} ({}) score {:.3}",
                        rank + 1,
                        rec.cocktail.name,
                        rec.cocktail.price,
                        rec.similarity_score
                    );
                    let _ = writeln!(text, "   {}", rec.cocktail.ingredients);
                    if !rec.matching_keywords.is_empty() {
                        let keywords: Vec<&str> =
                            rec.matching_keywords.iter().map(String::as_str).collect();
                        let _ = writeln!(text, "   matched: {}", keywords.join(", "));
                    }
                }
                text
            })?;
        }
        Command::Lookup { name } => {
            let found = recommend_commands::lookup(state, &name)?;
            out.emit(&found, |found| match found {
                Some(info) => render_details(info),
                None => format!("No cocktail named like '{name}'."),
            })?;
        }
        Command::Fuzzy { query, threshold } => {
            let matches = recommend_commands::fuzzy(state, &query, threshold)?;
            out.emit(&matches, |matches| {
                if matches.is_empty() {
                    return format!("No names within {threshold:.2} of '{query}'.");
                }
                let mut text = String::new();
                for m in matches {
                    let _ = writeln!(text, "{:.3}  {}", m.name_similarity, m.cocktail.name);
                }
                text
            })?;
        }
        Command::Order {
            name,
            quantity,
            request,
            at,
        } => {
            let entry = order_commands::place_order(state, &name, quantity, request.as_deref(), at)?;
            out.emit(&entry, |entry| format!("Ordered {}\n", render_order(entry)))?;
        }
        Command::Checkout { items, request } => {
            let report = order_commands::checkout(state, &items, request.as_deref())?;
            out.emit(&report, |report| {
                let mut text = String::new();
                for entry in &report.placed {
                    let _ = writeln!(text, "Ordered {}", render_order(entry));
                }
                for failed in &report.failed {
                    let _ = writeln!(text, "Failed {}: {}", failed.cocktail_name, failed.error);
                }
                text
            })?;
            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Orders => {
            let orders = order_commands::list_orders(state)?;
            out.emit(&orders, |orders| {
                if orders.is_empty() {
                    return "No orders recorded yet.".to_string();
                }
                let mut text = String::new();
                for entry in orders {
                    let _ = writeln!(text, "{}", render_order(entry));
                }
                text
            })?;
        }
        Command::Admin { action } => return run_admin(action, state, &out),
        Command::Analyze { reports, all } => {
            let selected = if all { Vec::new() } else { reports };
            let outputs = analysis_commands::run_reports(state, &selected)?;
            out.emit(&outputs, |outputs| {
                let rendered: Vec<String> = outputs.iter().map(ToString::to_string).collect();
                rendered.join("\n")
            })?;
        }
        Command::Reports => {
            let reports = analysis_commands::list_reports();
            out.emit(&reports, |reports| {
                let mut text = String::new();
                for info in reports {
                    let _ = writeln!(
                        text,
                        "{:>2}. {:<22} {}",
                        info.number,
                        info.id.id(),
                        info.description
                    );
                }
                text
            })?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_menu(action: MenuCommand, state: &AppState, out: &Output) -> Result<(), AppError> {
    match action {
        MenuCommand::List => {
            let menu = menu_commands::list_menu(state)?;
            out.emit(&menu, |menu| render_menu(menu))
        }
        MenuCommand::Search { keyword } => {
            let menu = menu_commands::search_menu(state, &keyword)?;
            out.emit(&menu, |menu| render_menu(menu))
        }
        MenuCommand::Show { name } => {
            let info = menu_commands::show_cocktail(state, &name)?;
            out.emit(&info, render_details)
        }
        MenuCommand::Add { name, fields } => {
            let info = menu_commands::add_cocktail(state, fields.into_cocktail(name))?;
            out.emit(&info, |info| format!("Added {}", info.name))
        }
        MenuCommand::Update { name, fields } => {
            let info = menu_commands::update_cocktail(state, &name, &fields.into_update())?;
            out.emit(&info, |info| format!("Updated {}", info.name))
        }
        MenuCommand::Delete { name } => {
            menu_commands::delete_cocktail(state, &name)?;
            out.message(&format!("Deleted {name}"))
        }
        MenuCommand::Stats => {
            let stats = menu_commands::menu_stats(state)?;
            out.emit(&stats, |stats| {
                let c = &stats.catalog;
                let p = &stats.prices;
                format!(
                    "Cocktails:        {} ({} unique)\n\
                     With ingredients: {}\n\
                     With garnish:     {}\n\
                     With glassware:   {}\n\
                     With preparation: {}\n\
                     Price:            avg ${:.2}, min ${:.2}, max ${:.2}\n",
                    c.total_cocktails,
                    c.unique_cocktails,
                    c.has_ingredients,
                    c.has_garnish,
                    c.has_glassware,
                    c.has_preparation,
                    p.average_price,
                    p.min_price,
                    p.max_price
                )
            })
        }
        MenuCommand::PriceRange { min, max } => {
            let menu = menu_commands::price_range(state, min, max)?;
            out.emit(&menu, |menu| render_menu(menu))
        }
        MenuCommand::Import { path } => {
            let summary = menu_commands::import_menu(state, &path)?;
            out.emit(&summary, |s| {
                format!("Imported {} cocktails, skipped {} rows", s.imported, s.skipped)
            })
        }
    }
}

fn run_admin(action: AdminCommand, state: &AppState, out: &Output) -> Result<ExitCode, AppError> {
    match action {
        AdminCommand::Add {
            name,
            password,
            role,
        } => {
            let admin = admin_commands::add_admin(state, &name, &password, role.as_deref())?;
            out.emit(&admin, |a| format!("Added admin {} ({})", a.name, a.role))?;
        }
        AdminCommand::Delete { name } => {
            admin_commands::delete_admin(state, &name)?;
            out.message(&format!("Deleted admin {}", name.trim()))?;
        }
        AdminCommand::List => {
            let admins = admin_commands::list_admins(state)?;
            out.emit(&admins, |admins| {
                let mut text = String::new();
                for a in admins {
                    let _ = writeln!(
                        text,
                        "{:>3}  {:<20} {:<10} {}",
                        a.id,
                        a.name,
                        a.role,
                        a.created_at.as_deref().unwrap_or("")
                    );
                }
                text
            })?;
        }
        AdminCommand::Verify { name, password } => {
            let ok = admin_commands::verify_admin(state, &name, &password)?;
            out.emit(&serde_json::json!({ "name": name.trim(), "verified": ok }), |_| {
                if ok {
                    "Credentials accepted".to_string()
                } else {
                    "Credentials rejected".to_string()
                }
            })?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn render_menu(menu: &[CocktailInfo]) -> String {
    if menu.is_empty() {
        return "No cocktails found.".to_string();
    }
    let width = menu.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let mut text = String::new();
    for c in menu {
        let _ = writeln!(text, "{:<width$}  {:>8}  {}", c.name, c.price, c.ingredients);
    }
    text
}

fn render_details(info: &CocktailInfo) -> String {
    format!(
        "{}\n\
         Ingredients: {}\n\
         Garnish:     {}\n\
         Glassware:   {}\n\
         Preparation: {}\n\
         Price:       {}\n\
         Notes:       {}\n",
        info.name,
        info.ingredients,
        info.garnish,
        info.glassware,
        info.preparation,
        info.price,
        info.note
    )
}

fn render_order(entry: &OrderEntry) -> String {
    let mut line = format!(
        "{}  {} x{}",
        entry.timestamp.format(ORDER_TIMESTAMP_FORMAT),
        entry.cocktail_name,
        entry.quantity
    );
    if let Some(request) = &entry.request {
        let _ = write!(line, " ({request})");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_recommend_with_multiword_query() {
        let cli = Cli::try_parse_from(["ktail", "recommend", "gin", "lime", "--top", "-1"]).unwrap();
        match cli.command {
            Command::Recommend { query, top } => {
                assert_eq!(query, vec!["gin", "lime"]);
                assert_eq!(top, -1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_order_timestamp_and_cart_lines() {
        let cli = Cli::try_parse_from([
            "ktail",
            "order",
            "Mojito",
            "-q",
            "2",
            "--at",
            "2025-07-04 21:15:00",
        ])
        .unwrap();
        match cli.command {
            Command::Order { quantity, at, .. } => {
                assert_eq!(quantity, 2);
                assert_eq!(at, parse_order_timestamp("2025-07-04 21:15:00"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["ktail", "order", "Mojito", "--at", "tonight"]).is_err());

        let cli = Cli::try_parse_from(["ktail", "checkout", "Negroni=2", "Mojito"]).unwrap();
        match cli.command {
            Command::Checkout { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].quantity, 2);
                assert_eq!(items[1].quantity, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_accepts_ids_and_numbers() {
        let cli = Cli::try_parse_from(["ktail", "--json", "analyze", "peak-time", "8"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Analyze { reports, all } => {
                assert!(!all);
                assert_eq!(reports, vec![Report::PeakTime, Report::SalesSummary]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["ktail", "analyze", "weather"]).is_err());
    }

    #[test]
    fn cocktail_fields_feed_add_and_update() {
        let fields = CocktailFields {
            ingredients: Some("Gin, Lime".to_string()),
            price: Some(11.0),
            ..Default::default()
        };
        let cocktail = fields.clone().into_cocktail("  Gimlet ".to_string());
        assert_eq!(cocktail.name, "Gimlet");
        assert_eq!(cocktail.price, Some(11.0));

        let update = fields.into_update();
        assert_eq!(update.ingredients.as_deref(), Some("Gin, Lime"));
        assert!(update.garnish.is_none());
    }

    #[test]
    fn order_lines_show_request() {
        let entry = OrderEntry {
            timestamp: parse_order_timestamp("2025-07-04 21:15:00").unwrap(),
            cocktail_name: "Mojito".to_string(),
            quantity: 2,
            request: Some("less sugar".to_string()),
            ingredients: Vec::new(),
        };
        assert_eq!(render_order(&entry), "2025-07-04 21:15:00  Mojito x2 (less sugar)");
    }
}
