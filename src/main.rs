use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use contactbook::api::Remote;
use contactbook::api::events::StoreEvent;
use contactbook::app::Settings;
use contactbook::view::{self, Sort, SortField, SortOrder};
use contactbook::{ApiClient, Category, Contact, ContactDraft, ContactError, ContactStore, Result};
use contactbook::{export, utils, validation};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// contactbook - manage contacts stored in a remote collection
#[derive(Parser, Debug)]
#[command(name = "contactbook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the contacts API (overrides config and CONTACTBOOK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter, e.g. `debug` or `contactbook=debug`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List contacts
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Column to sort by (default: newest first)
        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show the categories in use
    Categories,
    /// Create a contact
    Add {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Change fields of an existing contact
    Edit {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a contact
    Remove { id: String },
    /// Write the filtered contacts as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Destination file (default: contacts-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change settings
    Config {
        /// Persist a new API base URL
        #[arg(long)]
        set_api_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Match name, email or phone
    #[arg(short, long, default_value = "")]
    search: String,

    /// Only contacts in this category
    #[arg(short, long, value_parser = filter_category)]
    category: Option<Category>,
}

/// Filter categories exclude `none`: its wire value is empty, which would
/// match every contact rather than only uncategorized ones.
fn filter_category(s: &str) -> std::result::Result<Category, String> {
    match s.parse::<Category>()? {
        Category::Uncategorized => {
            Err("'none' cannot be used as a filter; omit --category to list every contact".into())
        }
        category => Ok(category),
    }
}

impl FilterArgs {
    fn category_value(&self) -> &'static str {
        self.category.map(Category::value).unwrap_or("")
    }
}

#[derive(Args, Debug)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    message: Option<String>,
    /// work, personal, family, friends, business, other or none
    #[arg(long)]
    category: Option<Category>,
}

impl FieldArgs {
    /// Overlays the given fields on `base`, validates the result as typed and
    /// returns it trimmed for submission.
    fn prepare(self, base: ContactDraft) -> Result<ContactDraft> {
        let draft = self.apply(base);
        validation::ensure_valid(&draft)?;
        Ok(draft.normalized())
    }

    fn apply(self, mut base: ContactDraft) -> ContactDraft {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.email {
            base.email = v;
        }
        if let Some(v) = self.phone {
            base.phone = v;
        }
        if let Some(v) = self.message {
            base.message = v;
        }
        if let Some(c) = self.category {
            base = base.with_category(c);
        }
        base
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortKey {
    Name,
    Email,
    Category,
    Created,
}

impl SortKey {
    fn field(self) -> SortField {
        match self {
            SortKey::Name => SortField::Name,
            SortKey::Email => SortField::Email,
            SortKey::Category => SortField::Category,
            SortKey::Created => SortField::CreatedAt,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = Settings::load();

    if let Command::Config { set_api_url } = &cli.command {
        if let Some(url) = set_api_url {
            ApiClient::new(url)?;
            settings.api_url = url.clone();
            let path = settings.save()?;
            println!("Saved {}", path.display());
        }
        println!("api_url = {}", settings.api_url);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    let store = ContactStore::new(ApiClient::new(&settings.api_url)?);
    let mut events = store.events();
    let result = utils::block_on(execute(&store, cli.command));
    let notified_failure = report(&mut events);

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(_) if notified_failure => Ok(ExitCode::FAILURE),
        Err(e) => Err(e),
    }
}

async fn execute<R: Remote>(store: &ContactStore<R>, command: Command) -> Result<()> {
    match command {
        Command::List { filter, sort, desc } => {
            store.refresh().await?;
            let sort = match sort {
                Some(key) => Sort::new(key.field(), if desc { SortOrder::Desc } else { SortOrder::Asc }),
                None => Sort::default(),
            };
            let rows = view::sorted(&store.view(&filter.search, filter.category_value()), sort);
            print_table(&rows);
        }
        Command::Categories => {
            store.refresh().await?;
            for value in store.categories() {
                let label = Category::from_value(&value).map(Category::label).unwrap_or(value.as_str());
                println!("{}\t{}", value, label);
            }
        }
        Command::Add { fields } => {
            let draft = fields.prepare(ContactDraft::default())?;
            let created = store.add(&draft).await?;
            println!("{}", created.id);
        }
        Command::Edit { id, fields } => {
            store.refresh().await?;
            let current = store.get(&id).ok_or_else(|| ContactError::NotFound(id.clone()))?;
            let draft = fields.prepare(current.to_draft())?;
            store.modify(&id, &draft).await?;
        }
        Command::Remove { id } => {
            store.remove(&id).await?;
        }
        Command::Export { filter, output } => {
            store.refresh().await?;
            let rows = store.view(&filter.search, filter.category_value());
            match export::to_csv(&rows) {
                Some(csv) => {
                    let path = output.unwrap_or_else(|| PathBuf::from(export::file_name(Local::now().date_naive())));
                    std::fs::write(&path, csv)?;
                    println!("Exported {} contact(s) to {}", rows.len(), path.display());
                }
                None => println!("No contacts to export."),
            }
        }
        Command::Config { .. } => {}
    }
    Ok(())
}

/// Prints pending store notifications; true if any reported a failure.
fn report(events: &mut broadcast::Receiver<StoreEvent>) -> bool {
    let mut failed = false;
    while let Ok(event) = events.try_recv() {
        if let Some(note) = event.notification() {
            eprintln!("{}: {}", note.title, note.description);
        }
        failed |= event.is_failure();
    }
    failed
}

fn category_cell(contact: &Contact) -> &str {
    if contact.category.is_empty() {
        return "";
    }
    contact.category_label().unwrap_or(contact.category.as_str())
}

fn print_table(rows: &[Contact]) {
    if rows.is_empty() {
        println!("No contacts found.");
        return;
    }
    let width = |f: fn(&Contact) -> &str, title: &str| {
        rows.iter().map(|c| f(c).chars().count()).max().unwrap_or(0).max(title.len())
    };
    let id_w = width(|c| c.id.as_str(), "ID");
    let name_w = width(|c| c.name.as_str(), "Name");
    let email_w = width(|c| c.email.as_str(), "Email");
    let phone_w = width(|c| c.phone.as_str(), "Phone");
    println!(
        "{:<id_w$}  {:<name_w$}  {:<email_w$}  {:<phone_w$}  Category",
        "ID", "Name", "Email", "Phone"
    );
    for c in rows {
        println!(
            "{:<id_w$}  {:<name_w$}  {:<email_w$}  {:<phone_w$}  {}",
            c.id,
            c.name,
            c.email,
            c.phone,
            category_cell(c)
        );
    }
}
