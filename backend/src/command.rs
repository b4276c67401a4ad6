use std::path::{Path, PathBuf};

use banksight_core::db::balance::{BalanceAction, BalanceResult};
use banksight_core::db::classify::Cardinality;
use banksight_core::db::filter::FilterPredicate;
use banksight_core::db::record::Record;
use banksight_core::{insight, Store};
use rust_decimal::Decimal;

use crate::error::CommandError;
use crate::render::{table_text, Output};

#[derive(clap::Subcommand)]
pub enum Command {
    /// List the tables in the store
    Tables,
    /// Show the columns of a table
    Columns { table: String },
    /// Show the rows of a table
    View {
        table: String,
        /// Maximum number of rows to show
        #[arg(long, default_value_t = 2000)]
        limit: u64,
    },
    /// Show rows matching every `column=value` predicate
    Filter {
        table: String,
        #[arg(short = 'w', long = "where", value_parser = parse_assignment)]
        predicates: Vec<(String, String)>,
        /// List each column's selectable values instead of querying
        #[arg(long)]
        describe: bool,
    },
    /// Insert a row; every column must be given
    Add {
        table: String,
        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Rewrite a row; columns not given keep their current value
    Update {
        table: String,
        identity: String,
        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Remove a row
    Delete {
        table: String,
        identity: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Check, deposit to or withdraw from an account
    Balance {
        account: String,
        #[command(subcommand)]
        action: BalanceCommand,
    },
    /// Replace a table's contents with the records of a `.csv` or `.json` file
    Import { table: String, file: PathBuf },
    /// List the analytical questions, or run one
    Insights {
        #[arg(long)]
        run: Option<u32>,
    },
}

#[derive(clap::Subcommand)]
pub enum BalanceCommand {
    Check,
    Deposit {
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
    },
    Withdraw {
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
    },
}

impl From<BalanceCommand> for BalanceAction {
    fn from(c: BalanceCommand) -> Self {
        match c {
            BalanceCommand::Check => BalanceAction::CheckBalance,
            BalanceCommand::Deposit { amount } => BalanceAction::Deposit(amount),
            BalanceCommand::Withdraw { amount } => BalanceAction::Withdraw(amount),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    fn from_path(path: &Path) -> Result<Self, CommandError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(ImportFormat::Csv),
            Some("json") => Ok(ImportFormat::Json),
            _ => Err(CommandError::UnknownFormat(path.display().to_string())),
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got '{}'", s))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((k.to_owned(), v.to_owned()))
}

fn parse_amount(s: &str) -> Result<Decimal, String> {
    let amount: Decimal = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{}': {}", s, e))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(format!("amount must not be negative, got {}", amount));
    }
    Ok(amount)
}

fn balance_text(res: &BalanceResult) -> String {
    match res.action {
        BalanceAction::CheckBalance => format!("Current balance: {:.2}", res.balance),
        BalanceAction::Deposit(amount) => format!(
            "{:.2} deposited. New balance: {:.2}",
            amount, res.balance
        ),
        BalanceAction::Withdraw(amount) => format!(
            "{:.2} withdrawn. New balance: {:.2}",
            amount, res.balance
        ),
    }
}

pub async fn run(store: &Store, command: Command, out: &Output) -> Result<(), CommandError> {
    match command {
        Command::Tables => {
            let tables = store.list_tables().await?;
            out.value(&tables, || tables.join("\n"))?;
        }
        Command::Columns { table } => {
            let schema = store.load_table(&table).await?;
            out.value(&schema, || {
                schema
                    .columns
                    .iter()
                    .map(|c| {
                        let mark = if c.name == schema.identity { "  (identity)" } else { "" };
                        format!("{}  {}{}", c.name, c.declared_type, mark)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::View { table, limit } => {
            let query = store.build_query(&table, &[]).await?.limit(limit);
            out.rows(&store.fetch(&query).await?)?;
        }
        Command::Filter {
            table,
            describe: true,
            ..
        } => {
            let meta = store.load_metadata(&table).await?;
            out.value(&meta, || {
                meta.columns
                    .iter()
                    .map(|c| match &c.cardinality {
                        Cardinality::Low(values) => format!(
                            "{}: one of [{}]",
                            c.name,
                            values.iter().cloned().collect::<Vec<_>>().join(", ")
                        ),
                        Cardinality::High => format!("{}: free text", c.name),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Filter {
            table, predicates, ..
        } => {
            let predicates: Vec<FilterPredicate> = predicates
                .into_iter()
                .map(|(column, value)| FilterPredicate { column, value })
                .collect();
            let query = store.build_query(&table, &predicates).await?;
            log::debug!("{}", query.to_sql());
            out.rows(&store.fetch(&query).await?)?;
        }
        Command::Add { table, fields } => {
            let fields: Record = fields.into_iter().collect();
            store.add(&table, &fields).await?;
            out.value(&fields, || "Record added.".to_owned())?;
        }
        Command::Update {
            table,
            identity,
            fields,
        } => {
            if fields.is_empty() {
                return Err(CommandError::MissingFields("--field".to_owned()));
            }
            let fields: Record = fields.into_iter().collect();
            store.update_columns(&table, &identity, &fields).await?;
            out.value(&fields, || "Record updated.".to_owned())?;
        }
        Command::Delete {
            table,
            identity,
            yes,
        } => {
            store.delete(&table, &identity, yes).await?;
            out.value(&identity, || "Record deleted.".to_owned())?;
        }
        Command::Balance { account, action } => {
            let res = store.apply_action(&account, action.into()).await?;
            out.value(&res, || balance_text(&res))?;
        }
        Command::Import { table, file } => {
            log::info!("importing {} into {}", file.display(), table);
            let count = match ImportFormat::from_path(&file)? {
                ImportFormat::Csv => store.import_csv(&table, &std::fs::read(&file)?).await?,
                ImportFormat::Json => {
                    let data = std::fs::read_to_string(&file)?;
                    let json: serde_json::Value = serde_json::from_str(&data)?;
                    store.import_json(&table, &json).await?
                }
            };
            out.value(&count, || format!("{} rows loaded into {}.", count, table))?;
        }
        Command::Insights { run: None } => {
            let catalog = insight::catalog();
            out.value(&catalog, || {
                catalog
                    .iter()
                    .map(|i| format!("Q{}: {}", i.id, i.question))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Insights { run: Some(id) } => {
            let res = store.run_insight(id).await?;
            out.value(&res, || {
                format!(
                    "Q{}: {}\n\n{}\n\n{}",
                    res.insight.id,
                    res.insight.question,
                    res.insight.sql,
                    table_text(&res.rows)
                )
            })?;
        }
    }
    Ok(())
}
