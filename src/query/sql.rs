//! Render a [`Predicate`] as a SQLite `WHERE` fragment over `images`.

use rusqlite::types::Value;

use super::predicate::{CmpOp, Field, Membership, Predicate};

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Field {
    fn column(&self) -> &'static str {
        match self {
            Field::Rating => "images.rating",
            Field::Favorite => "images.favorite",
        }
    }
}

impl CmpOp {
    fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ge => ">=",
        }
    }
}

impl Membership {
    /// Subquery yielding the ids of the images in this set.
    fn subquery(&self, params: &mut Vec<Value>) -> String {
        match self {
            Membership::TagIds(ids) => {
                params.extend(ids.iter().map(|id| Value::Integer(*id)));
                format!(
                    "SELECT image_id FROM image_tags WHERE tag_id IN ({})",
                    placeholders(ids.len())
                )
            }
            Membership::TagNames { category, names } => {
                params.extend(names.iter().map(|n| Value::Text(n.clone())));
                let mut sql = format!(
                    "SELECT it.image_id FROM image_tags it JOIN tags t ON t.id = it.tag_id \
                     WHERE t.name IN ({})",
                    placeholders(names.len())
                );
                if let Some(category) = category {
                    params.push(Value::Text(category.as_str().to_string()));
                    sql.push_str(" AND COALESCE(t.category, '') = ?");
                }
                sql
            }
            Membership::Albums(ids) => {
                params.extend(ids.iter().map(|id| Value::Integer(*id)));
                format!(
                    "SELECT image_id FROM album_images WHERE album_id IN ({})",
                    placeholders(ids.len())
                )
            }
        }
    }
}

impl Predicate {
    /// SQL fragment and its positional parameters, in order.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let sql = self.build_sql(&mut params);
        (sql, params)
    }

    fn build_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            Predicate::All => "1".to_string(),
            Predicate::Nothing => "0".to_string(),
            Predicate::And(parts) => join(parts, " AND ", "1", params),
            Predicate::Or(parts) => join(parts, " OR ", "0", params),
            // an empty set contains nothing
            Predicate::In(m) if m.is_empty() => "0".to_string(),
            Predicate::NotIn(m) if m.is_empty() => "1".to_string(),
            Predicate::In(m) => format!("images.id IN ({})", m.subquery(params)),
            Predicate::NotIn(m) => format!("images.id NOT IN ({})", m.subquery(params)),
            Predicate::Compare(field, op, value) => {
                params.push(Value::Integer(*value));
                format!("{} {} ?", field.column(), op.symbol())
            }
        }
    }
}

fn join(parts: &[Predicate], sep: &str, empty: &str, params: &mut Vec<Value>) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts.iter().map(|p| p.build_sql(params)).collect();
    format!("({})", rendered.join(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TagCategory;

    #[test]
    fn test_trivial_predicates() {
        assert_eq!(Predicate::All.to_sql(), ("1".to_string(), vec![]));
        assert_eq!(Predicate::Nothing.to_sql(), ("0".to_string(), vec![]));
        assert_eq!(Predicate::In(Membership::TagIds(vec![])).to_sql().0, "0");
        assert_eq!(Predicate::NotIn(Membership::Albums(vec![])).to_sql().0, "1");
        assert_eq!(Predicate::And(vec![]).to_sql().0, "1");
        assert_eq!(Predicate::Or(vec![]).to_sql().0, "0");
    }

    #[test]
    fn test_render_nested() {
        let predicate = Predicate::And(vec![
            Predicate::In(Membership::TagNames {
                category: Some(TagCategory::General),
                names: vec!["cat".into(), "hat".into()],
            }),
            Predicate::Or(vec![
                Predicate::In(Membership::Albums(vec![1])),
                Predicate::NotIn(Membership::Albums(vec![2, 3])),
            ]),
            Predicate::Compare(Field::Rating, CmpOp::Ge, 4),
        ]);

        let (sql, params) = predicate.to_sql();
        assert_eq!(
            sql,
            "(images.id IN (SELECT it.image_id FROM image_tags it JOIN tags t ON t.id = it.tag_id \
             WHERE t.name IN (?, ?) AND COALESCE(t.category, '') = ?) \
             AND (images.id IN (SELECT image_id FROM album_images WHERE album_id IN (?)) \
             OR images.id NOT IN (SELECT image_id FROM album_images WHERE album_id IN (?, ?))) \
             AND images.rating >= ?)"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("cat".into()),
                Value::Text("hat".into()),
                Value::Text("general".into()),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4),
            ]
        );
    }

    #[test]
    fn test_uncategorized_names_bind_empty_category() {
        let (sql, params) = Predicate::NotIn(Membership::TagNames {
            category: Some(TagCategory::Uncategorized),
            names: vec!["x".into()],
        })
        .to_sql();
        assert!(sql.starts_with("images.id NOT IN ("));
        assert_eq!(params, vec![Value::Text("x".into()), Value::Text(String::new())]);
    }

    #[test]
    fn test_any_category_omits_category_clause() {
        let (sql, params) = Predicate::In(Membership::TagNames {
            category: None,
            names: vec!["cat".into()],
        })
        .to_sql();
        assert!(!sql.contains("category"));
        assert_eq!(params.len(), 1);
    }
}
