use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};

use crate::error::AppError;
use crate::model::user::User;
use crate::state::AppState;

pub const CSV_HEADER: &str = "ID,Name,Email,Role,Team,Join Date";

/// Quotes a field only when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn employees_csv(users: &[User]) -> String {
    let mut rows = Vec::with_capacity(users.len() + 1);
    rows.push(CSV_HEADER.to_string());

    for u in users {
        let fields = [
            u.id.to_string(),
            u.name.clone(),
            u.email.clone(),
            u.role.to_string(),
            u.team.clone(),
            u.join_date.to_string(),
        ];
        rows.push(
            fields
                .iter()
                .map(|f| csv_field(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    rows.join("\n")
}

/// Download every user as CSV
#[utoipa::path(
    get,
    path = "/api/admin/export/employees",
    responses(
        (status = 200, description = "employees.csv attachment", content_type = "text/csv", body = String)
    ),
    tag = "Admin"
)]
pub async fn export_employees(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state
        .audit
        .record_as_admin("Exported Employee Data (CSV)", "")
        .await;

    let users = state.accounts.list_users().await?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename("employees.csv".into())],
        })
        .body(employees_csv(&users)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use chrono::NaiveDate;

    fn user(id: u64, name: &str, team: &str) -> User {
        User {
            id,
            name: name.into(),
            email: format!("u{id}@example.com"),
            password_hash: "secret".into(),
            role: Role::Employee,
            team: team.into(),
            join_date: NaiveDate::from_ymd_opt(2022, 3, 10).unwrap(),
        }
    }

    #[test]
    fn header_then_one_row_per_user() {
        let csv = employees_csv(&[user(2, "Jane Doe", "Engineering")]);
        let lines: Vec<_> = csv.split('\n').collect();
        assert_eq!(lines[0], "ID,Name,Email,Role,Team,Join Date");
        assert_eq!(lines[1], "2,Jane Doe,u2@example.com,employee,Engineering,2022-03-10");
        assert_eq!(lines.len(), 2);
        assert!(!csv.contains("secret"));
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let csv = employees_csv(&[user(3, "Doe, \"JD\" Jane", "R&D")]);
        assert!(csv.ends_with("3,\"Doe, \"\"JD\"\" Jane\",u3@example.com,employee,R&D,2022-03-10"));
    }
}
