use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, MySqlPool, types::Json};
use tracing::{debug, error, info};

use super::{
    AttendanceStore, AuditStore, CheckInOutcome, CheckOutOutcome, DecisionOutcome,
    GamificationStore, LeaveStore, SalaryStore, StoreError, StoreResult, UserStore,
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, GeoLocation, NewAttendance, NewCheckIn},
    audit_log::{AuditLogEntry, NewAuditLog},
    gamification::{Badge, GamificationProgress, GamificationSettings},
    leave_request::{LeaveBalance, LeaveRequest, LeaveStatus, NewLeaveRequest},
    role::Role,
    salary_slip::{NewSalarySlip, SalarySlip},
    user::{NewUser, User, UserChanges},
};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(16) NOT NULL,
        team VARCHAR(255) NOT NULL,
        join_date DATE NOT NULL,
        UNIQUE KEY uq_users_email (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        employee_name VARCHAR(255) NOT NULL,
        date DATE NOT NULL,
        check_in TIME NULL,
        check_out TIME NULL,
        status VARCHAR(16) NOT NULL,
        check_in_photo LONGTEXT NULL,
        check_in_lat DOUBLE NULL,
        check_in_lon DOUBLE NULL,
        UNIQUE KEY uq_attendance_day (employee_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS salaries (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        month VARCHAR(16) NOT NULL,
        year INT NOT NULL,
        basic DOUBLE NOT NULL,
        allowances DOUBLE NOT NULL,
        deductions DOUBLE NOT NULL,
        net_salary DOUBLE NOT NULL,
        KEY idx_salaries_employee (employee_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leave_requests (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        reason TEXT NOT NULL,
        status VARCHAR(16) NOT NULL,
        KEY idx_leave_employee (employee_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leave_balances (
        employee_id BIGINT UNSIGNED PRIMARY KEY,
        annual INT UNSIGNED NOT NULL,
        sick INT UNSIGNED NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        timestamp DATETIME(6) NOT NULL,
        user_id BIGINT UNSIGNED NOT NULL,
        user_name VARCHAR(255) NOT NULL,
        action VARCHAR(255) NOT NULL,
        details TEXT NOT NULL,
        KEY idx_audit_timestamp (timestamp)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS gamification (
        employee_id BIGINT UNSIGNED PRIMARY KEY,
        points INT UNSIGNED NOT NULL,
        badges JSON NOT NULL,
        leaderboard_rank INT UNSIGNED NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        name VARCHAR(64) PRIMARY KEY,
        points_for_punctuality INT UNSIGNED NOT NULL,
        points_for_perfect_week INT UNSIGNED NOT NULL
    )
    "#,
];

const GAMIFICATION_SETTINGS: &str = "gamification";

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, employee_name, date, check_in, check_out, status,
    check_in_photo, check_in_lat, check_in_lon
"#;

/// MySQL error code class for integrity constraint violations.
const INTEGRITY_VIOLATION: &str = "23000";
/// SQLSTATE InnoDB reports when it picks a deadlock victim (error 1213).
const SERIALIZATION_FAILURE: &str = "40001";

/// Whether a failed write lost a race against a concurrent writer of the
/// same unique key.
fn is_lost_race(code: Option<&str>) -> bool {
    matches!(code, Some(INTEGRITY_VIOLATION | SERIALIZATION_FAILURE))
}

fn lost_race(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => is_lost_race(db_err.code().as_deref()),
        _ => false,
    }
}

fn map_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Unavailable(e.to_string()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(INTEGRITY_VIOLATION) => {
            StoreError::Duplicate(db_err.message().to_string())
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

fn parse_enum<T: std::str::FromStr>(column: &str, value: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::Backend(format!("unexpected {column} value {value:?}")))
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    email: String,
    password: String,
    role: String,
    team: String,
    join_date: NaiveDate,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password,
            role: parse_enum("role", &row.role)?,
            team: row.team,
            join_date: row.join_date,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    date: NaiveDate,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    status: String,
    check_in_photo: Option<String>,
    check_in_lat: Option<f64>,
    check_in_lon: Option<f64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        let check_in_location = match (row.check_in_lat, row.check_in_lon) {
            (Some(lat), Some(lon)) => Some(GeoLocation { lat, lon }),
            _ => None,
        };
        Ok(AttendanceRecord {
            id: Some(row.id),
            employee_id: row.employee_id,
            employee_name: Some(row.employee_name),
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            status: parse_enum("attendance status", &row.status)?,
            check_in_photo: row.check_in_photo,
            check_in_location,
        })
    }
}

#[derive(FromRow)]
struct SalaryRow {
    id: u64,
    employee_id: u64,
    month: String,
    year: i32,
    basic: f64,
    allowances: f64,
    deductions: f64,
    net_salary: f64,
}

impl From<SalaryRow> for SalarySlip {
    fn from(row: SalaryRow) -> Self {
        SalarySlip {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            basic: row.basic,
            allowances: row.allowances,
            deductions: row.deductions,
            net_salary: row.net_salary,
        }
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    employee_name: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_enum("leave status", &row.status)?,
        })
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: u64,
    timestamp: DateTime<Utc>,
    user_id: u64,
    user_name: String,
    action: String,
    details: String,
}

impl From<AuditRow> for AuditLogEntry {
    fn from(row: AuditRow) -> Self {
        AuditLogEntry {
            id: row.id,
            timestamp: row.timestamp,
            user_id: row.user_id,
            user_name: row.user_name,
            action: row.action,
            details: row.details,
        }
    }
}

#[derive(FromRow)]
struct ProgressRow {
    points: u32,
    badges: Json<Vec<Badge>>,
    leaderboard_rank: Option<u32>,
}

#[derive(FromRow)]
struct SettingsRow {
    points_for_punctuality: u32,
    points_for_perfect_week: u32,
}

impl From<SettingsRow> for GamificationSettings {
    fn from(row: SettingsRow) -> Self {
        GamificationSettings {
            points_for_punctuality: row.points_for_punctuality,
            points_for_perfect_week: row.points_for_perfect_week,
        }
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// MySQL-backed store. The pool connects lazily and the schema is created on
/// first use, so the process keeps serving (with 503s) while the database is
/// unreachable.
pub struct MySqlStore {
    pool: MySqlPool,
    schema_ready: AtomicBool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            schema_ready: AtomicBool::new(false),
        }
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_err)?;
        }
        self.schema_ready.store(true, Ordering::Release);
        info!("Database schema ready");
        Ok(())
    }

    async fn pool(&self) -> StoreResult<&MySqlPool> {
        if !self.schema_ready.load(Ordering::Acquire) {
            self.ensure_schema().await.inspect_err(|e| {
                error!(error = %e, "Failed to prepare database schema");
            })?;
        }
        Ok(&self.pool)
    }

    async fn attendance_row(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(self.pool().await?)
            .await
            .map_err(map_err)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn leave_row(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT l.id, l.employee_id, u.name AS employee_name,
                   l.start_date, l.end_date, l.reason, l.status
            FROM leave_requests l
            LEFT JOIN users u ON u.id = l.employee_id
            WHERE l.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?
        .map(LeaveRequest::try_from)
        .transpose()
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password, role, team, join_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(&user.team)
        .bind(user.join_date)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        Ok(User {
            id: result.last_insert_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            team: user.team,
            join_date: user.join_date,
        })
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password, role, team, join_date FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?
        .map(User::try_from)
        .transpose()
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        // default collation compares case-insensitively
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password, role, team, join_date FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?
        .map(User::try_from)
        .transpose()
    }

    async fn first_user_with_role(&self, role: Role) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password, role, team, join_date
            FROM users WHERE role = ? ORDER BY id LIMIT 1
            "#,
        )
        .bind(role.to_string())
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password, role, team, join_date FROM users ORDER BY id",
        )
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        collect(rows)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool().await?)
            .await
            .map_err(map_err)?;
        Ok(total as u64)
    }

    async fn count_users_with_role(&self, role: Role) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.to_string())
            .fetch_one(self.pool().await?)
            .await
            .map_err(map_err)?;
        Ok(total as u64)
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<Option<User>> {
        let Some(mut user) = self.user_by_id(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(user));
        }

        let mut fields = Vec::new();
        if let Some(name) = &changes.name {
            fields.push(("name", SqlValue::String(name.clone())));
        }
        if let Some(team) = &changes.team {
            fields.push(("team", SqlValue::String(team.clone())));
        }
        if let Some(join_date) = changes.join_date {
            fields.push(("join_date", SqlValue::Date(join_date)));
        }
        if let Some(hash) = &changes.password_hash {
            fields.push(("password", SqlValue::String(hash.clone())));
        }

        let update = build_update_sql("users", fields, "id", id);
        execute_update(self.pool().await?, update)
            .await
            .map_err(map_err)?;

        changes.apply(&mut user);
        Ok(Some(user))
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        self.attendance_row(employee_id, date).await
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        limit: Option<usize>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? \
             ORDER BY date DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(limit.map(|l| l as u64).unwrap_or(u64::MAX))
            .fetch_all(self.pool().await?)
            .await
            .map_err(map_err)?;
        collect(rows)
    }

    async fn all_attendance(&self) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY date DESC, id DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .fetch_all(self.pool().await?)
            .await
            .map_err(map_err)?;
        collect(rows)
    }

    async fn count_attendance(
        &self,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE date = ? AND status = ?",
        )
        .bind(date)
        .bind(status.to_string())
        .fetch_one(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(total as u64)
    }

    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<AttendanceRecord> {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, employee_name, date, check_in, check_out, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(&record.employee_name)
        .bind(record.date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.to_string())
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        self.attendance_row(record.employee_id, record.date)
            .await?
            .ok_or_else(|| StoreError::Backend("inserted attendance row vanished".into()))
    }

    async fn record_check_in(&self, entry: NewCheckIn) -> StoreResult<CheckInOutcome> {
        let mut tx = self.pool().await?.begin().await.map_err(map_err)?;

        let existing = sqlx::query_as::<_, (u64, String)>(
            "SELECT id, status FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE",
        )
        .bind(entry.employee_id)
        .bind(entry.date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let (lat, lon) = entry.location.map(|l| (l.lat, l.lon)).unzip();
        let present = AttendanceStatus::Present.to_string();

        let written = match existing {
            Some((_, status)) if status == present => {
                tx.rollback().await.map_err(map_err)?;
                return Ok(CheckInOutcome::AlreadyPresent);
            }
            Some((id, _)) => sqlx::query(
                r#"
                UPDATE attendance
                SET employee_name = ?, check_in = ?, check_out = NULL, status = ?,
                    check_in_photo = ?, check_in_lat = ?, check_in_lon = ?
                WHERE id = ?
                "#,
            )
            .bind(&entry.employee_name)
            .bind(entry.time)
            .bind(&present)
            .bind(&entry.photo)
            .bind(lat)
            .bind(lon)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map(|_| id),
            None => sqlx::query(
                r#"
                INSERT INTO attendance
                    (employee_id, employee_name, date, check_in, status,
                     check_in_photo, check_in_lat, check_in_lon)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.employee_id)
            .bind(&entry.employee_name)
            .bind(entry.date)
            .bind(entry.time)
            .bind(&present)
            .bind(&entry.photo)
            .bind(lat)
            .bind(lon)
            .execute(&mut *tx)
            .await
            .map(|result| result.last_insert_id()),
        };

        match written {
            Ok(id) => {
                tx.commit().await.map_err(map_err)?;
                Ok(CheckInOutcome::Recorded(entry.into_record(id)))
            }
            // Two check-ins with no row yet both hold a gap lock, so the loser
            // sees either a duplicate key or a deadlock rollback. The winner
            // always writes a Present row.
            Err(e) if lost_race(&e) => {
                debug!(employee_id = entry.employee_id, error = %e, "Concurrent check-in lost");
                drop(tx);
                Ok(CheckInOutcome::AlreadyPresent)
            }
            Err(e) => Err(map_err(e)),
        }
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> StoreResult<CheckOutOutcome> {
        let mut tx = self.pool().await?.begin().await.map_err(map_err)?;

        let existing = sqlx::query_as::<_, (u64, Option<NaiveTime>, Option<NaiveTime>)>(
            r#"
            SELECT id, check_in, check_out FROM attendance
            WHERE employee_id = ? AND date = ? FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let id = match existing {
            None | Some((_, None, _)) => {
                tx.rollback().await.map_err(map_err)?;
                return Ok(CheckOutOutcome::NotCheckedIn);
            }
            Some((_, _, Some(_))) => {
                tx.rollback().await.map_err(map_err)?;
                return Ok(CheckOutOutcome::AlreadyCheckedOut);
            }
            Some((id, Some(_), None)) => id,
        };

        sqlx::query("UPDATE attendance SET check_out = ? WHERE id = ?")
            .bind(time)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        tx.commit().await.map_err(map_err)?;

        self.attendance_row(employee_id, date)
            .await?
            .map(CheckOutOutcome::Recorded)
            .ok_or_else(|| StoreError::Backend("checked-out attendance row vanished".into()))
    }
}

#[async_trait]
impl SalaryStore for MySqlStore {
    async fn insert_salary_slip(&self, slip: NewSalarySlip) -> StoreResult<SalarySlip> {
        let result = sqlx::query(
            r#"
            INSERT INTO salaries
                (employee_id, month, year, basic, allowances, deductions, net_salary)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(slip.employee_id)
        .bind(&slip.month)
        .bind(slip.year)
        .bind(slip.basic)
        .bind(slip.allowances)
        .bind(slip.deductions)
        .bind(slip.net_salary)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        Ok(slip.into_slip(result.last_insert_id()))
    }

    async fn salary_slips_for_employee(&self, employee_id: u64) -> StoreResult<Vec<SalarySlip>> {
        let rows = sqlx::query_as::<_, SalaryRow>(
            r#"
            SELECT id, employee_id, month, year, basic, allowances, deductions, net_salary
            FROM salaries WHERE employee_id = ? ORDER BY id
            "#,
        )
        .bind(employee_id)
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(SalarySlip::from).collect())
    }

    async fn all_salary_slips(&self) -> StoreResult<Vec<SalarySlip>> {
        let rows = sqlx::query_as::<_, SalaryRow>(
            r#"
            SELECT id, employee_id, month, year, basic, allowances, deductions, net_salary
            FROM salaries ORDER BY id
            "#,
        )
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(SalarySlip::from).collect())
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests (employee_id, start_date, end_date, reason, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status.to_string())
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn leave_requests_for_employee(
        &self,
        employee_id: u64,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, NULL AS employee_name,
                   start_date, end_date, reason, status
            FROM leave_requests
            WHERE employee_id = ?
            ORDER BY start_date DESC, id DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        collect(rows)
    }

    async fn all_leave_requests(&self) -> StoreResult<Vec<LeaveRequest>> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT l.id, l.employee_id, u.name AS employee_name,
                   l.start_date, l.end_date, l.reason, l.status
            FROM leave_requests l
            LEFT JOIN users u ON u.id = l.employee_id
            ORDER BY l.start_date DESC, l.id DESC
            "#,
        )
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        collect(rows)
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        status: LeaveStatus,
    ) -> StoreResult<DecisionOutcome> {
        let result = sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?")
            .bind(status.to_string())
            .bind(id)
            .bind(LeaveStatus::Pending.to_string())
            .execute(self.pool().await?)
            .await
            .map_err(map_err)?;

        let current = self.leave_row(id).await?;
        Ok(match current {
            None => DecisionOutcome::NotFound,
            Some(request) if result.rows_affected() == 0 => {
                DecisionOutcome::AlreadyDecided(request.status)
            }
            Some(request) => DecisionOutcome::Decided(request),
        })
    }

    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>> {
        let row = sqlx::query_as::<_, (u32, u32)>(
            "SELECT annual, sick FROM leave_balances WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(row.map(|(annual, sick)| LeaveBalance { annual, sick }))
    }

    async fn set_leave_balance(&self, employee_id: u64, balance: LeaveBalance) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (employee_id, annual, sick) VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE annual = VALUES(annual), sick = VALUES(sick)
            "#,
        )
        .bind(employee_id)
        .bind(balance.annual)
        .bind(balance.sick)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MySqlStore {
    async fn append_audit(&self, entry: NewAuditLog) -> StoreResult<AuditLogEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (timestamp, user_id, user_name, action, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.timestamp)
        .bind(entry.user_id)
        .bind(&entry.user_name)
        .bind(&entry.action)
        .bind(&entry.details)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        Ok(entry.into_entry(result.last_insert_id()))
    }

    async fn recent_audit(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, timestamp, user_id, user_name, action, details
            FROM audit_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as u64)
        .fetch_all(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }
}

#[async_trait]
impl GamificationStore for MySqlStore {
    async fn progress_for(&self, employee_id: u64) -> StoreResult<Option<GamificationProgress>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT points, badges, leaderboard_rank FROM gamification WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(map_err)?;

        Ok(row.map(|row| GamificationProgress {
            points: row.points,
            badges: row.badges.0,
            leaderboard_rank: row.leaderboard_rank,
        }))
    }

    async fn set_progress(
        &self,
        employee_id: u64,
        progress: GamificationProgress,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gamification (employee_id, points, badges, leaderboard_rank)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE points = VALUES(points), badges = VALUES(badges),
                                    leaderboard_rank = VALUES(leaderboard_rank)
            "#,
        )
        .bind(employee_id)
        .bind(progress.points)
        .bind(Json(&progress.badges))
        .bind(progress.leaderboard_rank)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn settings_or_insert(
        &self,
        defaults: GamificationSettings,
    ) -> StoreResult<GamificationSettings> {
        // INSERT IGNORE keeps an existing row untouched
        sqlx::query(
            r#"
            INSERT IGNORE INTO settings (name, points_for_punctuality, points_for_perfect_week)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(GAMIFICATION_SETTINGS)
        .bind(defaults.points_for_punctuality)
        .bind(defaults.points_for_perfect_week)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;

        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT points_for_punctuality, points_for_perfect_week FROM settings WHERE name = ?",
        )
        .bind(GAMIFICATION_SETTINGS)
        .fetch_one(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(row.into())
    }

    async fn upsert_settings(
        &self,
        settings: GamificationSettings,
    ) -> StoreResult<GamificationSettings> {
        sqlx::query(
            r#"
            INSERT INTO settings (name, points_for_punctuality, points_for_perfect_week)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                points_for_punctuality = VALUES(points_for_punctuality),
                points_for_perfect_week = VALUES(points_for_perfect_week)
            "#,
        )
        .bind(GAMIFICATION_SETTINGS)
        .bind(settings.points_for_punctuality)
        .bind(settings.points_for_perfect_week)
        .execute(self.pool().await?)
        .await
        .map_err(map_err)?;
        Ok(settings)
    }
}
