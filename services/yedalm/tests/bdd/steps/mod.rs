//! BDD step definitions for yedalm

pub mod admin_steps;
pub mod list_view_steps;
pub mod site_steps;

/// Parse `"3, 1, 2"` into ids
pub fn parse_ids(list: &str) -> Vec<i64> {
    list.split(',')
        .map(|id| id.trim().parse().expect("id must be an integer"))
        .collect()
}

/// Parse `"3:1, 1:2"` into `(id, order_index)` pairs
pub fn parse_pairs(list: &str) -> Vec<(i64, i64)> {
    list.split(',')
        .map(|pair| {
            let (id, order) = pair.trim().split_once(':').expect("pair must be id:order");
            (
                id.trim().parse().expect("id must be an integer"),
                order.trim().parse().expect("order must be an integer"),
            )
        })
        .collect()
}
