use clap::{Args, Parser, Subcommand};
use ledger_admin::config::{ApiConfig, ConfigError};
use ledger_admin::form::RecordId;
use ledger_admin::grid::{CellView, ColumnDescriptor, EMPTY_MESSAGE, GridPage, GridState};
use ledger_admin::net::{ApiError, Collection, HttpClient};
use ledger_admin::pages::{CategoriesPage, ItemsPage, PageError, ReceiptDetail, ReceiptsPage, TicketsPage};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Page(#[from] PageError),
    #[error("unknown collection `{0}`; expected items, categories, receipts or tickets")]
    UnknownCollection(String),
    #[error("unknown sort column `{0}`")]
    UnknownColumn(String),
    #[error("receipt {0} not found")]
    ReceiptNotFound(RecordId),
}

#[derive(Parser, Debug)]
#[command(name = "ledger-admin", about = "Browse the ledger admin service from the terminal")]
struct Cli {
    #[arg(long, env = "LEDGER_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one grid page of a collection.
    List(ListArgs),
    /// Print the purchases of one receipt.
    Receipt { id: RecordId },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// `items`, `categories`, `receipts` or `tickets`.
    collection: String,

    /// Free-text filter over every visible column.
    #[arg(long)]
    filter: Option<String>,

    /// Column id to sort ascending by.
    #[arg(long)]
    sort: Option<String>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ApiConfig::from_lookup(|key| match key {
        "LEDGER_API_BASE_URL" => cli.base_url.clone(),
        _ => std::env::var(key).ok(),
    })?;
    let client = HttpClient::new(&config)?;
    tracing::info!(base_url = client.base_url(), "ledger-admin starting");

    match cli.command {
        Command::List(args) => run_list(&client, &config, &args).await,
        Command::Receipt { id } => run_receipt(&client, &config, id).await,
    }
}

async fn run_list(client: &HttpClient, config: &ApiConfig, args: &ListArgs) -> Result<(), CliError> {
    let collection =
        Collection::from_path(&args.collection).ok_or_else(|| CliError::UnknownCollection(args.collection.clone()))?;
    let grid = match collection {
        Collection::Items => {
            let mut page = ItemsPage::new(config)?;
            page.reload(client).await?;
            let columns = page.columns();
            apply_args(&mut page.page.grid, &columns, args)?;
            page.grid()
        }
        Collection::Categories => {
            let mut page = CategoriesPage::new(config)?;
            page.page.reload(client).await?;
            apply_args(&mut page.page.grid, &CategoriesPage::columns(), args)?;
            page.grid()
        }
        Collection::Receipts => {
            let mut page = ReceiptsPage::new(config)?;
            page.reload(client).await?;
            let columns = page.columns();
            apply_args(&mut page.page.grid, &columns, args)?;
            page.grid()
        }
        Collection::Tickets => {
            let mut page = TicketsPage::new(config)?;
            page.reload(client).await?;
            apply_args(&mut page.page.grid, &TicketsPage::columns(), args)?;
            page.grid()
        }
    };
    print_grid(&grid);
    Ok(())
}

async fn run_receipt(client: &HttpClient, config: &ApiConfig, id: RecordId) -> Result<(), CliError> {
    let mut page = ReceiptsPage::new(config)?;
    page.reload(client).await?;
    page.show_detail(id);
    let detail = page.detail().ok_or(CliError::ReceiptNotFound(id))?;
    print_detail(&detail);
    Ok(())
}

fn apply_args<R>(state: &mut GridState, columns: &[ColumnDescriptor<R>], args: &ListArgs) -> Result<(), CliError> {
    if let Some(filter) = &args.filter {
        state.set_text_filter(filter.as_str());
    }
    if let Some(sort) = &args.sort {
        let column = columns.iter().find(|c| &c.id == sort).ok_or_else(|| CliError::UnknownColumn(sort.clone()))?;
        state.toggle_sort(column);
    }
    state.pagination.page_index = args.page.saturating_sub(1);
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_grid(grid: &GridPage) {
    let headers: Vec<&str> = grid.headers.iter().map(|h| h.header.as_str()).collect();
    println!("{}", headers.join("\t"));
    if grid.is_empty() {
        println!("{EMPTY_MESSAGE}");
    }
    for row in &grid.rows {
        let cells: Vec<String> = row.cells.iter().map(cell_text).collect();
        println!("{}", cells.join("\t"));
    }
    println!("{} ({} of {} rows)", grid.page_label(), grid.filtered_count, grid.total_count);
}

fn cell_text(cell: &CellView) -> String {
    match cell {
        CellView::Empty | CellView::Actions(_) => String::new(),
        CellView::Text(text) => text.clone(),
        CellView::Select(view) => view.selected.iter().map(|o| o.label.as_str()).collect::<Vec<_>>().join(", "),
    }
}

fn print_detail(detail: &ReceiptDetail) {
    println!("{}", detail.title);
    println!("{}", detail.subtitle);
    for line in &detail.lines {
        let category = line.category.as_deref().unwrap_or("-");
        println!("{} {} ({category}) {}\t{}", line.quantity, line.item, line.unit_price, line.price);
    }
    println!("Total: {}", detail.total);
}
