use pot_schema::{establish, MIGRATIONS};
use potdesk::commands;
use potdesk::AppError;

fn run<F>(conn: &mut pot_schema::SqliteConnection, f: F) -> (Result<(), AppError>, String)
    where F: FnOnce(&mut pot_schema::SqliteConnection, &mut Vec<u8>) -> Result<(), AppError>
{
    let mut buf = Vec::new();
    let res = f(conn, &mut buf);
    (res, String::from_utf8(buf).unwrap())
}

#[test]
fn migrate_then_migrate_again() {
    let mut conn = establish(":memory:").unwrap();
    let (res, out) = run(&mut conn, |c, o| commands::migrate(c, o));
    res.unwrap();
    assert_eq!(out.lines().count(), MIGRATIONS.len());
    assert!(out.starts_with("applied 20240111083000"));

    let (res, out) = run(&mut conn, |c, o| commands::migrate(c, o));
    res.unwrap();
    assert_eq!(out.trim(), "nothing pending");
}

#[test]
fn status_lists_pending_before_migrating() {
    let mut conn = establish(":memory:").unwrap();
    let (res, out) = run(&mut conn, |c, o| commands::status(c, o));
    res.unwrap();
    assert_eq!(out.lines().filter(|l| l.starts_with("pending")).count(), MIGRATIONS.len());
}

#[test]
fn rollback_is_rejected_with_exit_code_4() {
    let mut conn = establish(":memory:").unwrap();
    let (res, out) = run(&mut conn, |c, o| commands::rollback(c, o));
    res.unwrap();
    assert_eq!(out.trim(), "nothing applied");

    run(&mut conn, |c, o| commands::migrate(c, o)).0.unwrap();
    let (res, _) = run(&mut conn, |c, o| commands::rollback(c, o));
    let err = res.unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("irreversible"));
}

#[test]
fn verify_after_migrate_is_ok() {
    let mut conn = establish(":memory:").unwrap();
    run(&mut conn, |c, o| commands::migrate(c, o)).0.unwrap();
    let (res, out) = run(&mut conn, |c, o| commands::verify(c, o));
    res.unwrap();
    assert_eq!(out.trim(), "schema ok");
}
