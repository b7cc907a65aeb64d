table! {
    categories (id) {
        id -> Integer,
        name -> Text,
        user_id -> Integer,
    }
}

table! {
    items (id) {
        id -> Integer,
        name -> Text,
        description -> Text,
        category_id -> Integer,
        user_id -> Integer,
    }
}

table! {
    users (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        picture -> Text,
    }
}

joinable!(categories -> users (user_id));
joinable!(items -> categories (category_id));
joinable!(items -> users (user_id));

allow_tables_to_appear_in_same_query!(
    categories,
    items,
    users,
);
