use std::error::Error;
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ticket_office::config::Config;
use ticket_office::{Listing, Outcome, TicketOffice};

fn arg<'a, 'b>(name: &'a str, help: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(name).help(help).required(true)
}

fn opt<'a, 'b>(name: &'a str, help: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(name).long(name).help(help).takes_value(true)
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("Ticket office")
        .about("Back-office tooling for train ticket sales: catalog, orders, seats and reports")
        .author("Yoeri Otten <y.d.otten@student.utwente.nl>")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("database").long("database").short("d").takes_value(true)
            .help("SQLite database file, overrides DATABASE_URL"))
        .subcommand(SubCommand::with_name("search").about("Search trains with free seats between two stations")
            .arg(arg("from", "Departure station")).arg(arg("to", "Arrival station"))
            .arg(opt("date", "Travel date, YYYY-MM-DD")))
        .subcommand(SubCommand::with_name("route").about("Show the stops of a train")
            .arg(arg("train", "Train number")).arg(opt("date", "Run date, YYYY-MM-DD")))
        .subcommand(SubCommand::with_name("book").about("Create an order in status Ready")
            .arg(arg("train", "Train number")).arg(arg("date", "Run date, YYYY-MM-DD"))
            .arg(arg("from", "Departure station")).arg(arg("to", "Arrival station"))
            .arg(arg("price", "Ticket price")).arg(arg("name", "Customer name"))
            .arg(arg("id-card", "Customer id card")))
        .subcommand(SubCommand::with_name("cancel").about("Cancel a Ready order").arg(arg("order", "Order id")))
        .subcommand(SubCommand::with_name("refund").about("Request a refund of a successful order").arg(arg("order", "Order id")))
        .subcommand(SubCommand::with_name("process").about("Approve or reject a pending order")
            .arg(arg("order", "Order id"))
            .arg(arg("decision", "Staff decision").possible_values(&["approve", "reject"]))
            .arg(arg("staff", "Salesperson id")))
        .subcommand(SubCommand::with_name("order").about("Show one order").arg(arg("order", "Order id")))
        .subcommand(SubCommand::with_name("orders").about("List the orders of a passenger")
            .arg(arg("name", "Customer name")).arg(arg("id-card", "Customer id card")))
        .subcommand(SubCommand::with_name("pending").about("List orders waiting for a staff decision"))
        .subcommand(SubCommand::with_name("operations").about("Show the staff audit trail").arg(opt("order", "Order id")))
        .subcommand(SubCommand::with_name("stations").about("List stations"))
        .subcommand(SubCommand::with_name("add-station").about("Add a station")
            .arg(arg("name", "Station name")).arg(opt("code", "Station code")))
        .subcommand(SubCommand::with_name("rename-station").about("Rename a station")
            .arg(arg("old", "Current name")).arg(arg("new", "New name")))
        .subcommand(SubCommand::with_name("trains").about("List trains"))
        .subcommand(SubCommand::with_name("save-train").about("Add or update a train")
            .arg(arg("train", "Train number"))
            .arg(arg("type", "Train type").possible_values(&["High-Speed", "Bullet", "Express", "Fast", "Direct"]))
            .arg(arg("seats", "Total seats")).arg(arg("from", "Departure station")).arg(arg("to", "Arrival station")))
        .subcommand(SubCommand::with_name("delete-train").about("Delete a train, refunding its future orders")
            .arg(arg("train", "Train number")))
        .subcommand(SubCommand::with_name("schedules").about("List train schedules"))
        .subcommand(SubCommand::with_name("schedule-stop").about("Add a stop to a train run")
            .arg(arg("train", "Train number")).arg(arg("station", "Station name"))
            .arg(arg("date", "Run date, YYYY-MM-DD")).arg(arg("order", "Stop order, starting at 1"))
            .arg(opt("arrival", "Arrival time, YYYY-MM-DD HH:MM")).arg(opt("departure", "Departure time, YYYY-MM-DD HH:MM")))
        .subcommand(SubCommand::with_name("prices").about("List prices").arg(opt("train", "Train number")))
        .subcommand(SubCommand::with_name("set-price").about("Set the price of a segment")
            .arg(arg("train", "Train number")).arg(arg("from", "Departure station"))
            .arg(arg("to", "Arrival station")).arg(arg("price", "Price")))
        .subcommand(SubCommand::with_name("delete-price").about("Remove the price of a segment")
            .arg(arg("train", "Train number")).arg(arg("from", "Departure station")).arg(arg("to", "Arrival station")))
        .subcommand(SubCommand::with_name("register-customer").about("Register a customer")
            .arg(arg("name", "Name")).arg(arg("phone", "Phone number")).arg(arg("id-card", "Id card")))
        .subcommand(SubCommand::with_name("register-staff").about("Register a salesperson")
            .arg(arg("id", "Salesperson id")).arg(arg("name", "Name")).arg(arg("contact", "Contact number"))
            .arg(arg("email", "Email")).arg(arg("role", "Role").possible_values(&["Manager", "Salesperson"])))
        .subcommand(SubCommand::with_name("update-staff").about("Update a salesperson")
            .arg(arg("id", "Salesperson id")).arg(arg("name", "Name")).arg(arg("contact", "Contact number"))
            .arg(arg("email", "Email")).arg(arg("role", "Role").possible_values(&["Manager", "Salesperson"])))
        .subcommand(SubCommand::with_name("remove-staff").about("Remove a salesperson").arg(arg("id", "Salesperson id")))
        .subcommand(SubCommand::with_name("staff").about("List staff"))
        .subcommand(SubCommand::with_name("report").about("Daily sales per salesperson")
            .arg(arg("date", "Report date, YYYY-MM-DD")).arg(opt("staff", "Only this salesperson"))
        )
}

fn report(outcome: Outcome) -> bool {
    match &outcome.reference {
        Some(reference) => println!("{} [{}]", outcome.message, reference),
        None => println!("{}", outcome.message),
    }
    outcome.success
}

fn print<T: Serialize>(listing: Listing<T>) -> Result<bool, Box<dyn Error + 'static>> {
    for row in &listing.rows {
        println!("{}", serde_json::to_string(row)?);
    }
    if let Some(message) = &listing.message {
        eprintln!("{}", message);
    }
    Ok(listing.is_ok())
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.value_of(name).unwrap_or_default()
}

fn number(matches: &ArgMatches, name: &str) -> Result<i32, Box<dyn Error + 'static>> {
    let raw = value(matches, name);
    raw.trim().parse().map_err(|_| format!("{} must be a whole number, got {:?}", name, raw).into())
}

fn run(office: &mut TicketOffice, matches: &ArgMatches) -> Result<bool, Box<dyn Error + 'static>> {
    let ok = match matches.subcommand() {
        ("search", Some(m)) => print(office.search_available_tickets(value(m, "from"), value(m, "to"), m.value_of("date")))?,
        ("route", Some(m)) => print(office.train_route(value(m, "train"), m.value_of("date")))?,
        ("book", Some(m)) => report(office.create_order(
            value(m, "train"),
            value(m, "date"),
            value(m, "from"),
            value(m, "to"),
            value(m, "price"),
            value(m, "name"),
            value(m, "id-card"),
        )),
        ("cancel", Some(m)) => report(office.cancel_order(value(m, "order"))),
        ("refund", Some(m)) => report(office.request_refund(value(m, "order"))),
        ("process", Some(m)) => {
            report(office.process_order(value(m, "order"), value(m, "decision") == "approve", value(m, "staff")))
        }
        ("order", Some(m)) => print(office.order(value(m, "order")))?,
        ("orders", Some(m)) => print(office.orders_by_passenger(value(m, "name"), value(m, "id-card")))?,
        ("pending", _) => print(office.pending_orders())?,
        ("operations", Some(m)) => print(office.order_operations(m.value_of("order")))?,
        ("stations", _) => print(office.list_stations())?,
        ("add-station", Some(m)) => report(office.add_station(value(m, "name"), m.value_of("code"))),
        ("rename-station", Some(m)) => report(office.rename_station(value(m, "old"), value(m, "new"))),
        ("trains", _) => print(office.list_trains())?,
        ("save-train", Some(m)) => report(office.upsert_train(
            value(m, "train"),
            value(m, "type"),
            number(m, "seats")?,
            value(m, "from"),
            value(m, "to"),
        )),
        ("delete-train", Some(m)) => report(office.delete_train(value(m, "train"))),
        ("schedules", _) => print(office.list_schedules())?,
        ("schedule-stop", Some(m)) => report(office.schedule_stop(
            value(m, "train"),
            value(m, "station"),
            value(m, "date"),
            m.value_of("arrival"),
            m.value_of("departure"),
            number(m, "order")?,
        )),
        ("prices", Some(m)) => print(office.list_prices(m.value_of("train")))?,
        ("set-price", Some(m)) => {
            report(office.upsert_price(value(m, "train"), value(m, "from"), value(m, "to"), value(m, "price")))
        }
        ("delete-price", Some(m)) => report(office.delete_price(value(m, "train"), value(m, "from"), value(m, "to"))),
        ("register-customer", Some(m)) => {
            report(office.register_customer(value(m, "name"), value(m, "phone"), value(m, "id-card")))
        }
        ("register-staff", Some(m)) => report(office.register_salesperson(
            value(m, "id"),
            value(m, "name"),
            value(m, "contact"),
            value(m, "email"),
            value(m, "role"),
        )),
        ("update-staff", Some(m)) => report(office.update_salesperson(
            value(m, "id"),
            value(m, "name"),
            value(m, "contact"),
            value(m, "email"),
            value(m, "role"),
        )),
        ("remove-staff", Some(m)) => report(office.remove_salesperson(value(m, "id"))),
        ("staff", _) => print(office.list_staff())?,
        ("report", Some(m)) => print(office.daily_sales_report(value(m, "date"), m.value_of("staff")))?,
        (other, _) => return Err(format!("Unknown command {:?}", other).into()),
    };
    Ok(ok)
}

fn main() -> Result<(), Box<dyn Error + 'static>> {
    let matches = app().get_matches();

    // .env first, the command line wins over it
    let config = Config::from_env().with_database(matches.value_of("database"));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    debug!(database = %config.database_url, "opening ticket office");
    let mut office = TicketOffice::open(&config.database_url)?;
    let ok = run(&mut office, &matches)?;
    office.close();

    if !ok {
        process::exit(1);
    }
    Ok(())
}
