mod common;

use common::*;
use ticket_office::catalog::StopRole;
use ticket_office::database::types::{OperationType, OrderStatus, TrainType};

#[test]
fn search_reports_the_tightest_leg() {
    let mut office = office();
    set_seats(&office, TRAIN, RUN, "B", 7);

    let through = office.search_available_tickets("A", "C", Some(RUN));
    assert!(through.is_ok());
    assert_eq!(through.rows.len(), 1);
    let offer = &through.rows[0];
    assert_eq!(offer.train_number, TRAIN);
    assert_eq!(offer.available_seats, 7);
    assert_eq!(offer.price_cents, 10_000);
    assert_eq!(offer.train_type, TrainType::HighSpeed);
    assert_eq!(offer.departure_station, "A");
    assert_eq!(offer.arrival_station, "C");

    // the counter at the arrival stop is never read
    assert_eq!(office.search_available_tickets("A", "B", Some(RUN)).rows[0].available_seats, CAPACITY);
    assert_eq!(office.search_available_tickets("B", "C", Some(RUN)).rows[0].available_seats, 7);
}

#[test]
fn search_follows_approved_bookings() {
    let mut office = office();
    let order_id = book(&mut office, RUN, "A", "B", "50");
    assert_ok(&approve(&mut office, &order_id));

    assert_eq!(office.search_available_tickets("A", "C", Some(RUN)).rows[0].available_seats, CAPACITY - 1);
    assert_eq!(office.search_available_tickets("B", "C", Some(RUN)).rows[0].available_seats, CAPACITY);
}

#[test]
fn search_without_date_spans_every_run_in_departure_order() {
    let mut office = office();
    let offers = office.search_available_tickets("A", "C", None).rows;
    let dates: Vec<_> = offers.iter().map(|o| o.start_date).collect();
    assert_eq!(dates, vec![date(PAST_RUN), date(RUN)]);
    assert!(offers.iter().all(|o| o.departure_time.is_some() && o.arrival_time.is_some()));

    assert!(office.search_available_tickets("A", "C", Some("2026-12-24")).rows.is_empty());
}

#[test]
fn search_fails_silently() {
    let mut office = office();
    let wrong_way = office.search_available_tickets("C", "A", None);
    assert!(wrong_way.rows.is_empty());
    assert_eq!(
        wrong_way.message.as_deref(),
        Some("No trains found passing through both stations in the correct order.")
    );
    assert!(office.search_available_tickets("A", "Atlantis", None).rows.is_empty());

    assert_ok(&office.delete_price(TRAIN, "A", "C"));
    assert!(office.search_available_tickets("A", "C", Some(RUN)).rows.is_empty());
}

#[test]
fn route_tags_roles_and_sold_seats() {
    let mut office = office();
    let order_id = book(&mut office, RUN, "A", "B", "50");
    assert_ok(&approve(&mut office, &order_id));

    let route = office.train_route(TRAIN, Some(RUN)).rows;
    let roles: Vec<StopRole> = route.iter().map(|s| s.role).collect();
    assert_eq!(roles, vec![StopRole::Departure, StopRole::Stopover, StopRole::Arrival]);
    let sold: Vec<i32> = route.iter().map(|s| s.sold).collect();
    assert_eq!(sold, vec![1, 0, 0]);
    assert_eq!(route[1].station_code.as_deref(), Some("BBB"));

    let all = office.train_route(TRAIN, None).rows;
    assert_eq!(all.len(), 6);
    assert_eq!(all[0].start_date, date(PAST_RUN));
    assert_eq!(all[3].start_date, date(RUN));
    assert_eq!(all[3].stop_order, 1);
}

#[test]
fn route_of_unknown_train_or_date() {
    let mut office = office();
    let missing = office.train_route("X9", None);
    assert!(!missing.is_ok());
    assert_eq!(missing.message.as_deref(), Some("Train X9 not found"));

    let quiet_day = office.train_route(TRAIN, Some("2027-01-01"));
    assert!(quiet_day.rows.is_empty());
    assert_eq!(quiet_day.message.as_deref(), Some("No route information found for date 2027-01-01"));
}

#[test]
fn deleting_a_train_refunds_future_orders_only() {
    let mut office = office();
    let sold = book(&mut office, RUN, "A", "C", "100");
    let refunding = book(&mut office, RUN, "A", "B", "50");
    let waiting = book(&mut office, RUN, "B", "C", "60");
    let travelled = book(&mut office, PAST_RUN, "A", "C", "100");
    for order_id in [&sold, &refunding, &travelled].iter() {
        assert_ok(&approve(&mut office, order_id));
    }
    assert_ok(&office.request_refund(&refunding));
    let audit_rows = office.order_operations(None).rows.len();

    let outcome = office.delete_train(TRAIN);
    assert_ok(&outcome);
    assert!(outcome.message.contains("2 orders refunded"), "{}", outcome.message);

    for order_id in [&sold, &refunding].iter() {
        let order = office.order(order_id).rows.remove(0);
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.operation_type, OperationType::Refund);
        assert_eq!(order.train_type, None);
    }
    assert_eq!(status(&mut office, &waiting), OrderStatus::Ready);
    assert_eq!(status(&mut office, &travelled), OrderStatus::Success);

    assert_eq!(office.order_operations(None).rows.len(), audit_rows, "cascade is not audited");
    assert!(seats(&office, TRAIN, RUN).is_empty());
    assert!(seats(&office, TRAIN, PAST_RUN).is_empty());
    assert!(office.list_prices(Some(TRAIN)).rows.is_empty());
    assert!(office.list_trains().rows.is_empty());
    assert!(!office.train_route(TRAIN, None).is_ok());
    assert!(!office.delete_train(TRAIN).success);
}

#[test]
fn capacity_change_keeps_sold_counts() {
    let mut office = office();
    let order_id = book(&mut office, RUN, "A", "B", "50");
    assert_ok(&approve(&mut office, &order_id));

    assert_ok(&office.upsert_train(TRAIN, "Express", 1000, "A", "C"));
    assert_eq!(seats(&office, TRAIN, RUN), vec![999, 1000, 1000]);
    let train = office.list_trains().rows.remove(0);
    assert_eq!(train.train_type, TrainType::Express);
    assert_eq!(train.total_seats, 1000);
    assert_eq!(office.train_route(TRAIN, Some(RUN)).rows[0].sold, 1);

    set_seats(&office, TRAIN, RUN, "B", 0);
    let outcome = office.upsert_train(TRAIN, "Express", 999, "A", "C");
    assert!(!outcome.success);
    assert_eq!(seats(&office, TRAIN, RUN), vec![999, 0, 1000]);
}

#[test]
fn train_input_is_validated() {
    let mut office = office();
    assert!(!office.upsert_train("G 1", "High-Speed", 10, "A", "C").success);
    assert!(!office.upsert_train("D7", "Maglev", 10, "A", "C").success);
    assert!(!office.upsert_train("D7", "Direct", 0, "A", "C").success);
    assert!(!office.upsert_train("D7", "Direct", 10, "A", "A").success);

    assert_ok(&office.upsert_train("D7", "Direct", 10, "A", "Zed"));
    let stations: Vec<String> = office.list_stations().rows.into_iter().map(|s| s.station_name).collect();
    assert!(stations.contains(&"Zed".to_string()));
}

#[test]
fn stops_are_unique_per_run() {
    let mut office = office();
    let outcome = office.schedule_stop(TRAIN, "B", RUN, None, None, 4);
    assert!(!outcome.success, "station visited twice");
    let outcome = office.schedule_stop(TRAIN, "D", RUN, None, None, 2);
    assert!(!outcome.success, "unknown station");

    assert_ok(&office.add_station("D", None));
    assert!(!office.schedule_stop(TRAIN, "D", RUN, None, None, 2).success, "stop order taken");
    assert!(!office.schedule_stop(TRAIN, "D", RUN, None, None, 0).success);
    assert!(!office
        .schedule_stop(TRAIN, "D", RUN, Some("2026-11-01 12:00"), Some("2026-11-01 11:00"), 4)
        .success);

    let outcome = office.schedule_stop(TRAIN, "D", RUN, Some("2026-11-01 12:00"), None, 4);
    assert_ok(&outcome);
    assert_eq!(outcome.message, format!("Stop 4 scheduled with {} seats", CAPACITY));
}

#[test]
fn schedules_list_trains_without_runs() {
    let mut office = office();
    assert_ok(&office.upsert_train("Z1", "Bullet", 300, "C", "A"));

    let rows = office.list_schedules().rows;
    assert_eq!(rows.iter().filter(|r| r.train_number == TRAIN).count(), 6);
    let bare: Vec<_> = rows.iter().filter(|r| r.train_number == "Z1").collect();
    assert_eq!(bare.len(), 1);
    assert_eq!(bare[0].start_date, None);
    assert_eq!(bare[0].departure_station, "C");
}

#[test]
fn prices_upsert_and_delete() {
    let mut office = office();
    let outcome = office.upsert_price(TRAIN, "A", "C", "$120.5");
    assert_ok(&outcome);
    assert_eq!(outcome.message, "Price set to $120.50");

    let prices = office.list_prices(Some(TRAIN)).rows;
    assert_eq!(prices.len(), 3);
    let through = prices.iter().find(|p| p.departure_station == "A" && p.arrival_station == "C").unwrap();
    assert_eq!(through.price_cents, 12_050);

    assert!(!office.upsert_price(TRAIN, "A", "Nowhere", "10").success);
    assert!(!office.upsert_price("X9", "A", "C", "10").success);
    assert!(!office.upsert_price(TRAIN, "A", "C", "-3").success);

    assert_ok(&office.delete_price(TRAIN, "A", "B"));
    assert!(!office.delete_price(TRAIN, "A", "B").success);
    assert_eq!(office.list_prices(None).rows.len(), 2);
}

#[test]
fn stations_are_renamed_in_place() {
    let mut office = office();
    assert!(!office.add_station("A", None).success);

    assert_ok(&office.rename_station("B", "Bergen"));
    assert!(!office.rename_station("B", "Bern").success);
    assert!(!office.rename_station("A", "C").success);

    let route = office.train_route(TRAIN, Some(RUN)).rows;
    assert_eq!(route[1].station_name, "Bergen");
    assert_eq!(office.search_available_tickets("Bergen", "C", Some(RUN)).rows.len(), 1);
}

#[test]
fn staff_registry() {
    let mut office = office();
    assert!(!office.register_customer("Alice Again", "1", ID_CARD).success);
    assert!(!office.register_salesperson(STAFF, "Bob Twin", "1", "b@example.com", "Salesperson").success);
    assert!(!office.register_salesperson("S002", "Carol", "1", "c@example.com", "Janitor").success);

    assert_ok(&office.register_salesperson("M001", "Carol Wu", "1", "carol@example.com", "Manager"));
    assert_eq!(office.list_staff().rows.len(), 2);

    let order_id = book(&mut office, RUN, "A", "B", "50");
    assert_ok(&office.process_order(&order_id, true, "M001"));
    assert_ok(&office.remove_salesperson("M001"));
    assert!(!office.remove_salesperson("M001").success);

    assert_eq!(office.list_staff().rows.len(), 1);
    assert!(!office.order_operations(Some(&order_id)).is_ok());
    assert_eq!(status(&mut office, &order_id), OrderStatus::Success);
}

#[test]
fn staff_details_can_be_edited() {
    let mut office = office();
    assert_ok(&office.register_salesperson("M001", "Carol Wu", "1", "carol@example.com", "Manager"));

    let outcome = office.update_salesperson(STAFF, "Bob Li", "13911111111", "bob.li@example.com", "Manager");
    assert_ok(&outcome);
    assert_eq!(outcome.message, format!("Staff {} updated successfully", STAFF));

    let staff = office.list_staff().rows;
    let bob = staff.iter().find(|s| s.salesperson_id == STAFF).unwrap();
    assert_eq!(bob.contact_number, "13911111111");
    assert_eq!(bob.email, "bob.li@example.com");
    assert_eq!(bob.role.to_string(), "Manager");

    // keeping one's own email is fine, taking a colleague's is not
    assert_ok(&office.update_salesperson(STAFF, "Bob Li", "1", "bob.li@example.com", "Salesperson"));
    let outcome = office.update_salesperson(STAFF, "Bob Li", "1", "carol@example.com", "Salesperson");
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Email carol@example.com is already in use by another staff");

    let outcome = office.update_salesperson("S404", "Nobody", "1", "nobody@example.com", "Salesperson");
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Staff ID S404 not found");
    assert!(!office.update_salesperson(STAFF, "Bob Li", "1", "bob.li@example.com", "Janitor").success);
}
