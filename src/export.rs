use crate::api::models::Contact;
use chrono::{Local, NaiveDate, TimeZone};
use std::fmt::Display;

const HEADERS: [&str; 6] = ["Name", "Email", "Phone", "Category", "Message", "Created At"];

/// CSV rendering of `contacts` with creation dates in the local time zone.
/// `None` when there is nothing to export.
pub fn to_csv(contacts: &[Contact]) -> Option<String> {
    to_csv_in(contacts, &Local)
}

pub fn to_csv_in<Tz>(contacts: &[Contact], tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if contacts.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(contacts.len() + 1);
    lines.push(HEADERS.join(","));
    for contact in contacts {
        let created = contact
            .created_at
            .map(|ts| ts.with_timezone(tz).format("%-m/%-d/%Y").to_string())
            .unwrap_or_default();
        let cells = [
            contact.name.as_str(),
            contact.email.as_str(),
            contact.phone.as_str(),
            contact.category_label().unwrap_or(""),
            contact.message.as_str(),
            created.as_str(),
        ];
        let row: Vec<String> = cells.iter().map(|c| quote(c)).collect();
        lines.push(row.join(","));
    }
    Some(lines.join("\n"))
}

/// Suggested download name for an export taken on `date`.
pub fn file_name(date: NaiveDate) -> String {
    format!("contacts-{}.csv", date.format("%Y-%m-%d"))
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn contact(name: &str, category: &str, message: &str) -> Contact {
        Contact {
            id: "x".into(),
            name: name.into(),
            email: "a@b.co".into(),
            phone: "5551234567".into(),
            message: message.into(),
            category: category.into(),
            created_at: None,
        }
    }

    #[test]
    fn empty_view_exports_nothing() {
        assert_eq!(to_csv(&[]), None);
    }

    #[test]
    fn renders_header_and_quoted_rows() {
        let mut c = contact("Jo \"JJ\" Smith", "work", "line, with comma");
        c.created_at = Some(Utc.with_ymd_and_hms(2024, 6, 4, 10, 0, 0).unwrap());
        let csv = to_csv_in(&[c, contact("Kim", "", "")], &Utc).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Email,Phone,Category,Message,Created At");
        assert_eq!(
            lines[1],
            r#""Jo ""JJ"" Smith","a@b.co","5551234567","Work","line, with comma","6/4/2024""#
        );
        assert_eq!(lines[2], r#""Kim","a@b.co","5551234567","No Category","","""#);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unknown_category_has_empty_label() {
        let csv = to_csv_in(&[contact("Kim", "colleagues", "")], &Utc).unwrap();
        assert!(csv.lines().nth(1).unwrap().contains(r#","5551234567","","#));
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(file_name(date), "contacts-2024-01-09.csv");
    }
}
