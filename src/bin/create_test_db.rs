use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use budgetbook_rs::{
    AccountKind, CategoryName, NewAccount, NewCategory, RecordRef, Transaction, USER_ID_HEADER,
    create_account, create_category, create_transaction, create_user, initialize_db, upsert_budget,
};

/// A utility for creating a test database for the REST API server of budgetbook_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");
    let user = create_user("Test User", &connection)?;

    println!("Creating categories and an account...");
    let salary = create_category(
        user.id,
        NewCategory::new(CategoryName::new("Salary")?).is_income(true),
        &connection,
    )?;
    let mut expense_categories = Vec::new();
    for (name, budget) in [("Groceries", 600), ("Rent", 1800), ("Eating out", 150)] {
        let category = create_category(
            user.id,
            NewCategory::new(CategoryName::new(name)?),
            &connection,
        )?;
        expense_categories.push((category, Decimal::from(budget)));
    }

    let account = create_account(
        user.id,
        NewAccount {
            name: "Everyday".to_owned(),
            kind: AccountKind::Debit,
            balance: Decimal::from(2500),
            institution_name: "Test Bank".to_owned(),
        },
        &connection,
    )?;

    println!("Creating budgets and transactions for the last two months...");
    let this_month = OffsetDateTime::now_utc().date().replace_day(1)?;
    let last_month = (this_month - Duration::days(1)).replace_day(1)?;

    for month in [last_month, this_month] {
        create_transaction(
            &user,
            Transaction::build(Decimal::from(5200), month, account.id)
                .category(RecordRef::Id(salary.id))
                .payee(RecordRef::Name("Employer Ltd".to_owned()))
                .description("Pay"),
            &connection,
        )?;

        for (index, (category, budget)) in expense_categories.iter().enumerate() {
            upsert_budget(user.id, category.id, *budget, month, &connection)?;

            let spent = -(*budget * Decimal::new(9, 1)).round_dp(2);
            create_transaction(
                &user,
                Transaction::build(spent, month.replace_day(3 + 7 * index as u8)?, account.id)
                    .category(RecordRef::Id(category.id))
                    .payee(RecordRef::Name(format!("{} Co", category.name)))
                    .description(&format!("{} for {}", category.name, month.month())),
                &connection,
            )?;
        }
    }

    println!("Success! Send requests with the header {USER_ID_HEADER}: {}", user.id);

    Ok(())
}
