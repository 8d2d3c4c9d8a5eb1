use super::types::{FilterOrderInfo, LeadColumn, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Newest first, with `id` as a tie-breaker so pages are stable
    pub fn default_order() -> Vec<FilterOrderInfo> {
        vec![
            FilterOrderInfo { column: LeadColumn::CreatedAt, sort: SortDirection::Desc },
            FilterOrderInfo { column: LeadColumn::Id, sort: SortDirection::Desc },
        ]
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", i.column.quoted(), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_sql() {
        assert_eq!(
            FilterOrder::generate(&FilterOrder::default_order()),
            "ORDER BY \"created_at\" DESC, \"id\" DESC"
        );
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
