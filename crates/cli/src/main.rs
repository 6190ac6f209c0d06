use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use clinic_core::address::Address;
use clinic_core::config::config_from_lookup;
use clinic_core::expense::ExpenseForm;
use clinic_core::medicine::MedicineForm;
use clinic_core::patient::{Patient, PatientForm};
use clinic_core::session::Session;
use clinic_core::validation::{sanitize_national_id, sanitize_phone};
use clinic_core::{Clinic, Money, NonEmptyText, RecordId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Outpatient clinic records CLI")]
struct Cli {
    /// Staff PIN, required by commands that change data
    #[arg(long, global = true, env = "CLINIC_PIN", hide_env_values = true)]
    pin: Option<String>,
    /// Name recorded as the operator for changes
    #[arg(long, global = true)]
    operator: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the newest patients
    List {
        /// Filter on name, HN or national ID
        #[arg(long)]
        filter: Option<String>,
    },
    /// Quick search by national ID or first-name prefix
    Search { term: String },
    /// Register a patient
    Register {
        #[arg(long)]
        national_id: String,
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birthdate: NaiveDate,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        house_no: Option<String>,
        #[arg(long)]
        moo: Option<String>,
        #[arg(long)]
        tambon: Option<String>,
        #[arg(long)]
        amphoe: Option<String>,
        #[arg(long)]
        province: Option<String>,
        #[arg(long)]
        zip: Option<String>,
        #[arg(long, default_value = "")]
        drug_allergy: String,
    },
    /// Show the medicine catalog
    Medicines,
    /// Add a medicine to the catalog
    AddMedicine {
        #[arg(long)]
        name: String,
        #[arg(long)]
        unit: String,
        /// Price per unit in baht, e.g. 2.50
        #[arg(long)]
        price: String,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        #[arg(long, default_value = "")]
        instruction: String,
    },
    /// Add units to a medicine's stock
    Restock { medicine_id: String, qty: i64 },
    /// Medicines below the low-stock threshold
    LowStock,
    /// Visit history of a patient
    History { patient_id: String },
    /// Print a visit report as Markdown
    Report { visit_id: String },
    /// Print the medicine label sheet of a visit as HTML
    Labels { visit_id: String },
    /// Monthly income, expenses and margin (YYYY-MM)
    Month { month: String },
    /// Record an expense
    AddExpense {
        #[arg(long)]
        title: String,
        /// Amount in baht, e.g. 1500 or 99.50
        #[arg(long)]
        amount: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        remark: String,
    },
}

fn session(clinic: &Clinic, pin: Option<&str>, operator: Option<&str>) -> anyhow::Result<Session> {
    let pin = pin.context("this command changes data; pass --pin or set CLINIC_PIN")?;
    let operator = operator
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(NonEmptyText::new)
        .transpose()?;
    Ok(clinic.auth().login(pin, operator)?)
}

fn print_patient(p: &Patient) {
    println!(
        "{}  {}  {}  {}  (id {})",
        p.hn,
        p.national_id,
        p.full_name(),
        p.birthdate,
        p.id
    );
}

fn optional_address(
    house_no: Option<String>,
    moo: Option<String>,
    tambon: Option<String>,
    amphoe: Option<String>,
    province: Option<String>,
    zip: Option<String>,
) -> Option<Address> {
    if house_no.is_none() && tambon.is_none() && amphoe.is_none() && province.is_none() {
        return None;
    }
    Some(Address {
        house_no: house_no.unwrap_or_default(),
        moo,
        tambon: tambon.unwrap_or_default(),
        amphoe: amphoe.unwrap_or_default(),
        province: province.unwrap_or_default(),
        zip,
    })
}

fn run(cli: Cli, clinic: &Clinic) -> anyhow::Result<()> {
    let pin = cli.pin.as_deref();
    let operator = cli.operator.as_deref();

    match cli.command {
        Some(Commands::List { filter }) => {
            let patients = clinic.patients().list_recent(filter.as_deref())?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            patients.iter().for_each(print_patient);
        }
        Some(Commands::Search { term }) => {
            clinic
                .patients()
                .quick_search(&term)?
                .iter()
                .for_each(print_patient);
        }
        Some(Commands::Register {
            national_id,
            prefix,
            first_name,
            last_name,
            birthdate,
            phone,
            house_no,
            moo,
            tambon,
            amphoe,
            province,
            zip,
            drug_allergy,
        }) => {
            let session = session(clinic, pin, operator)?;
            let form = PatientForm {
                national_id: sanitize_national_id(&national_id),
                prefix,
                first_name,
                last_name,
                birthdate: Some(birthdate),
                phone: sanitize_phone(&phone),
                address: optional_address(house_no, moo, tambon, amphoe, province, zip),
                drug_allergy,
                ..Default::default()
            };
            let patient = clinic.patients().register(&session, &form)?;
            println!("Registered {} as {}", patient.full_name(), patient.hn);
        }
        Some(Commands::Medicines) => {
            for m in clinic.stock().list()? {
                println!(
                    "{:<30} {:>6} {:<8} ฿{:>10}  (id {})",
                    m.name, m.stock_qty, m.unit, m.price_per_unit, m.id
                );
            }
        }
        Some(Commands::AddMedicine {
            name,
            unit,
            price,
            stock,
            instruction,
        }) => {
            let session = session(clinic, pin, operator)?;
            let form = MedicineForm {
                name,
                unit,
                price_per_unit: Money::parse_baht(&price)?,
                stock_qty: stock,
                instruction,
            };
            let medicine = clinic.stock().create(&session, &form)?;
            println!("Added {} (id {})", medicine.name, medicine.id);
        }
        Some(Commands::Restock { medicine_id, qty }) => {
            let session = session(clinic, pin, operator)?;
            let id = RecordId::parse(&medicine_id)?;
            let level = clinic.stock().restock(&session, &id, qty)?;
            println!("Stock is now {}", level);
        }
        Some(Commands::LowStock) => {
            let low = clinic.stock().low_stock_alerts()?;
            if low.is_empty() {
                println!("Nothing is running low.");
            }
            for m in low {
                println!("{:<30} {:>6} {}", m.name, m.stock_qty, m.unit);
            }
        }
        Some(Commands::History { patient_id }) => {
            let id = RecordId::parse(&patient_id)?;
            for detail in clinic.patients().visit_history(&id)? {
                println!(
                    "{}  {}  ฿{}  {}  (id {})",
                    detail.visit.created_at.format("%Y-%m-%d %H:%M"),
                    detail.visit.examiner,
                    detail.visit.total_cost,
                    detail.visit.notes.diagnosis,
                    detail.visit.id
                );
            }
        }
        Some(Commands::Report { visit_id }) => {
            let detail = clinic.visits().get(&RecordId::parse(&visit_id)?)?;
            println!("{}", clinic.documents().visit_report(&detail)?);
        }
        Some(Commands::Labels { visit_id }) => {
            let detail = clinic.visits().get(&RecordId::parse(&visit_id)?)?;
            println!("{}", clinic.documents().label_sheet(&detail));
        }
        Some(Commands::Month { month }) => {
            let s = clinic.accounting().monthly_summary(&month)?;
            println!("Month:     {}", s.month);
            println!("Income:    ฿{} ({} visits)", s.income, s.visit_count);
            println!("Expenses:  ฿{} ({} items)", s.total_expense, s.expense_count);
            println!("Net:       ฿{}", s.net);
            println!("Margin:    {:.1}%", s.margin_percent);
            for e in &s.expenses {
                println!("  {}  {:<30} ฿{:>10}  {}", e.date, e.title, e.amount, e.category);
            }
        }
        Some(Commands::AddExpense {
            title,
            amount,
            date,
            category,
            remark,
        }) => {
            let session = session(clinic, pin, operator)?;
            let form = ExpenseForm {
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                title,
                amount: Money::parse_baht(&amount)?,
                category,
                remark,
            };
            let expense = clinic.accounting().add_expense(&session, &form)?;
            println!("Recorded ฿{} on {} (id {})", expense.amount, expense.date, expense.id);
        }
        None => {
            println!("Use 'clinic --help' for commands");
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = Arc::new(config_from_lookup(|key| std::env::var(key).ok())?);
    let clinic = Clinic::open(cfg).context("failed to open clinic data")?;
    run(cli, &clinic)
}
