//! Customers and staff. Both are registered up front; the booking flow only looks them up.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use crate::database::models::{Customer, Salesperson};
use crate::database::schema::{customers, salespersons};
use crate::error::{Result, ServiceError};

pub fn register_customer(conn: &SqliteConnection, customer: &Customer) -> Result<()> {
    let exists = customers::table
        .find(customer.id_card.as_str())
        .first::<Customer>(conn)
        .optional()?
        .is_some();
    if exists {
        return Err(ServiceError::validation(format!("Customer with id card {} already exists", customer.id_card)));
    }

    diesel::insert_into(customers::table).values(customer).execute(conn)?;
    info!(id_card = %customer.id_card, "customer registered");
    Ok(())
}

pub fn register_salesperson(conn: &SqliteConnection, salesperson: &Salesperson) -> Result<()> {
    diesel::insert_into(salespersons::table).values(salesperson).execute(conn)?;
    info!(id = %salesperson.salesperson_id, role = %salesperson.role, "salesperson registered");
    Ok(())
}

/// Rewrites name, contact details and role of an existing staff member.
pub fn update_salesperson(conn: &SqliteConnection, salesperson: &Salesperson) -> Result<()> {
    let id = salesperson.salesperson_id.as_str();
    let email_taken = salespersons::table
        .filter(salespersons::email.eq(salesperson.email.as_str()))
        .filter(salespersons::salesperson_id.ne(id))
        .select(salespersons::salesperson_id)
        .first::<String>(conn)
        .optional()?
        .is_some();
    if email_taken {
        return Err(ServiceError::validation(format!(
            "Email {} is already in use by another staff",
            salesperson.email
        )));
    }

    let updated = diesel::update(salespersons::table.find(id))
        .set((
            salespersons::salesperson_name.eq(salesperson.salesperson_name.as_str()),
            salespersons::contact_number.eq(salesperson.contact_number.as_str()),
            salespersons::email.eq(salesperson.email.as_str()),
            salespersons::role.eq(salesperson.role),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(ServiceError::not_found(format!("Staff ID {} not found", id)));
    }
    info!(id, role = %salesperson.role, "salesperson updated");
    Ok(())
}

/// Removes a staff member together with their audit rows.
pub fn remove_salesperson(conn: &SqliteConnection, salesperson_id: &str) -> Result<()> {
    let deleted = diesel::delete(salespersons::table.find(salesperson_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found(format!("Salesperson {} not found", salesperson_id)));
    }
    info!(id = salesperson_id, "salesperson removed");
    Ok(())
}

pub fn list_staff(conn: &SqliteConnection) -> Result<Vec<Salesperson>> {
    Ok(salespersons::table
        .order((salespersons::role.asc(), salespersons::salesperson_name.asc()))
        .load(conn)?)
}
