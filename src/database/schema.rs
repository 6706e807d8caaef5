table! {
    use diesel::sql_types::*;

    customers (id_card) {
        id_card -> Text,
        name -> Text,
        phone -> Text,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    order_operations (operation_id) {
        operation_id -> Integer,
        order_id -> Text,
        salesperson_id -> Text,
        operation_type -> DecisionMapping,
        original_status -> OrderStatusMapping,
        new_status -> OrderStatusMapping,
        operation_time -> Timestamp,
        remarks -> Nullable<Text>,
    }
}

table! {
    use diesel::sql_types::*;

    prices (price_id) {
        price_id -> Integer,
        train_number -> Text,
        departure_station_id -> Integer,
        arrival_station_id -> Integer,
        price_cents -> BigInt,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    sales_orders (order_id) {
        order_id -> Text,
        train_number -> Text,
        start_date -> Date,
        departure_station_id -> Integer,
        arrival_station_id -> Integer,
        price_cents -> BigInt,
        customer_id -> Text,
        operation_type -> OperationTypeMapping,
        operation_time -> Timestamp,
        status -> OrderStatusMapping,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    salespersons (salesperson_id) {
        salesperson_id -> Text,
        salesperson_name -> Text,
        contact_number -> Text,
        email -> Text,
        role -> StaffRoleMapping,
    }
}

table! {
    use diesel::sql_types::*;

    stations (station_id) {
        station_id -> Integer,
        station_name -> Text,
        station_code -> Nullable<Text>,
    }
}

table! {
    use diesel::sql_types::*;

    stopovers (stopover_id) {
        stopover_id -> Integer,
        train_number -> Text,
        station_id -> Integer,
        start_date -> Date,
        arrival_time -> Nullable<Timestamp>,
        departure_time -> Nullable<Timestamp>,
        stop_order -> Integer,
        seats -> Integer,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    trains (train_number) {
        train_number -> Text,
        train_type -> TrainTypeMapping,
        total_seats -> Integer,
        departure_station_id -> Integer,
        arrival_station_id -> Integer,
    }
}

// Views, read only
table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    order_details (order_id) {
        order_id -> Text,
        train_number -> Text,
        train_type -> Nullable<TrainTypeMapping>,
        start_date -> Date,
        departure_station -> Text,
        arrival_station -> Text,
        price_cents -> BigInt,
        customer_name -> Text,
        customer_id_card -> Text,
        customer_phone -> Text,
        operation_type -> OperationTypeMapping,
        operation_time -> Timestamp,
        status -> OrderStatusMapping,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    price_details (price_id) {
        price_id -> Integer,
        train_number -> Text,
        train_type -> TrainTypeMapping,
        departure_station -> Text,
        arrival_station -> Text,
        price_cents -> BigInt,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::database::types::*;

    operation_details (operation_id) {
        operation_id -> Integer,
        order_id -> Text,
        train_number -> Text,
        customer_name -> Text,
        salesperson_id -> Text,
        salesperson_name -> Text,
        operation_type -> DecisionMapping,
        original_status -> OrderStatusMapping,
        new_status -> OrderStatusMapping,
        price_cents -> BigInt,
        operation_time -> Timestamp,
        remarks -> Nullable<Text>,
    }
}

joinable!(order_operations -> sales_orders (order_id));
joinable!(order_operations -> salespersons (salesperson_id));
joinable!(prices -> trains (train_number));
joinable!(sales_orders -> customers (customer_id));
joinable!(stopovers -> stations (station_id));
joinable!(stopovers -> trains (train_number));

allow_tables_to_appear_in_same_query!(
    customers,
    order_operations,
    prices,
    sales_orders,
    salespersons,
    stations,
    stopovers,
    trains,
);
