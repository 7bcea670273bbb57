use super::*;
use crate::clause::{Direction, OrderTerm};
use crate::client::{Client, Statement};
use crate::error::OrmError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Log {
    prepared: Vec<String>,
    bound: Vec<(String, Value, ParamType)>,
    executed: usize,
    rows: Vec<Row>,
}

#[derive(Clone, Default)]
struct RecordingClient(Rc<RefCell<Log>>);

struct RecordingStatement(Rc<RefCell<Log>>);

impl Statement for RecordingStatement {
    fn bind_value(&mut self, name: &str, value: &Value, param_type: ParamType) -> OrmResult<()> {
        self.0
            .borrow_mut()
            .bound
            .push((name.to_string(), value.clone(), param_type));
        Ok(())
    }

    fn execute(&mut self) -> OrmResult<()> {
        self.0.borrow_mut().executed += 1;
        Ok(())
    }

    fn fetch_all(&mut self) -> OrmResult<Vec<Row>> {
        Ok(self.0.borrow().rows.clone())
    }
}

impl Client for RecordingClient {
    fn prepare(&self, sql: &str) -> OrmResult<Box<dyn Statement>> {
        self.0.borrow_mut().prepared.push(sql.to_string());
        Ok(Box::new(RecordingStatement(self.0.clone())))
    }

    fn begin_transaction(&self) -> OrmResult<()> {
        Ok(())
    }

    fn commit(&self) -> OrmResult<()> {
        Ok(())
    }

    fn roll_back(&self) -> OrmResult<()> {
        Ok(())
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        Err(OrmError::database("no insert"))
    }
}

fn connection() -> (Connection, RecordingClient) {
    let client = RecordingClient::default();
    (Connection::new(client.clone()), client)
}

fn params(entries: &[(&str, Value)]) -> Params {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_full_select_rendering() {
    let (conn, _) = connection();
    let mut query = conn.select("*", "t", Some("t"));
    query
        .join("j", Some("j"), "j.a=t.a")
        .where_(["x=:x"])
        .order_by([OrderTerm::asc("t.a")])
        .limit(10, Some(5))
        .bind_param("x", ParamType::Int);

    assert_eq!(
        query.to_sql(),
        "SELECT * FROM t INNER JOIN j ON j.a=t.a WHERE (x=:x) ORDER BY t.a ASC LIMIT 5, 10"
    );
    assert_eq!(query.to_string(), query.to_sql());
    assert_eq!(query.to_sql(), query.to_sql());
}

#[test]
fn test_select_with_joins_and_group() {
    let (conn, _) = connection();
    let mut query = conn.select(["pd.id", "count(*) as n"], "products", Some("pd"));
    query
        .left_join("producers", Some("pr"), "pr.id = pd.producer_id")
        .right_join("types", Some("tp"), "type_id")
        .outer_join("extras", None, vec!["ex.pid = pd.id", "ex.on = 1"])
        .group_by_having(["pd.id"], ["count(*) > 1"])
        .order_by(vec![OrderTerm::from("RAND()")]);

    assert_eq!(
        query.to_sql(),
        "SELECT pd.id, count(*) as n FROM products pd \
         LEFT OUTER JOIN producers pr ON pr.id = pd.producer_id \
         RIGHT OUTER JOIN types tp USING(type_id) \
         FULL OUTER JOIN extras ON ex.pid = pd.id && ex.on = 1 \
         GROUP BY pd.id HAVING count(*) > 1 ORDER BY RAND()"
    );
}

#[test]
fn test_update_renders_main_table_set_and_where() {
    let (conn, _) = connection();
    let mut query = conn.update("test_table", Some("t"));
    query
        .join("other", Some("o"), "o.id = t.oid")
        .set("param2 = :param2")
        .where_("param1 = :param1")
        .order_by([("t.a", Direction::Desc)])
        .limit(1, None);

    assert_eq!(
        query.to_sql(),
        "UPDATE test_table t SET param2 = :param2 WHERE (param1 = :param1)"
    );
}

#[test]
fn test_insert_ignores_where() {
    let (conn, _) = connection();
    let mut query = conn.insert("test_table", None);
    query.set(["a = :a", "b = :b"]).where_(["a = 1"]);
    assert_eq!(query.to_sql(), "INSERT INTO test_table SET a = :a, b = :b");
}

#[test]
fn test_delete_renders_where() {
    let (conn, _) = connection();
    let mut query = conn.delete("test_table", None);
    query.set("x = 1").where_(["aa = :aa", "bb = :bb"]);
    assert_eq!(query.to_sql(), "DELETE FROM test_table WHERE (aa = :aa && bb = :bb)");
}

#[test]
fn test_nested_where_groups() {
    let (conn, _) = connection();
    let mut query = conn.select("*", "users", None);
    query.where_(Query::all_of(["status = :status"]).with(Query::any_of(["a = 1", "b = 2"])));
    assert_eq!(
        query.to_sql(),
        "SELECT * FROM users WHERE (status = :status && (a = 1 || b = 2))"
    );
}

#[test]
fn test_execute_rejects_mismatched_params_before_preparing() {
    let (conn, client) = connection();
    let mut query = conn.select("*", "t", None);
    query.where_("x = :x").bind_param(":x", ParamType::Int);

    let err = query
        .execute(&params(&[(":y", Value::Int(1))]))
        .unwrap_err();
    assert!(err.is_data());
    assert!(client.0.borrow().prepared.is_empty());

    let err = query.execute(&Params::new()).unwrap_err();
    assert!(err.is_data());
    assert!(client.0.borrow().prepared.is_empty());
}

#[test]
fn test_execute_binds_declared_types_and_returns_rows() {
    let (conn, client) = connection();
    let mut row = Row::new();
    row.insert("id".to_string(), Value::Int(3));
    client.0.borrow_mut().rows.push(row.clone());

    let mut query = conn.select("*", "t", None);
    query
        .where_(["id = :id", "name = :name"])
        .bind_param(":id", ParamType::Int)
        .bind_param(":name", ParamType::String);

    let rows = query
        .execute(&params(&[
            (":name", Value::from("bob")),
            (":id", Value::Int(3)),
        ]))
        .unwrap();
    assert_eq!(rows, Some(vec![row]));

    let log = client.0.borrow();
    assert_eq!(log.prepared, vec!["SELECT * FROM t WHERE (id = :id && name = :name)"]);
    assert_eq!(
        log.bound,
        vec![
            (":id".to_string(), Value::Int(3), ParamType::Int),
            (":name".to_string(), Value::from("bob"), ParamType::String),
        ]
    );
    assert_eq!(log.executed, 1);
}

#[test]
fn test_non_select_returns_none() {
    let (conn, _) = connection();
    let mut query = conn.delete("t", None);
    query.where_("id = :id").bind_param("id", ParamType::Int);
    let result = query.execute(&params(&[("id", Value::Int(1))])).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_statement_is_reused_until_mutation() {
    let (conn, client) = connection();
    let mut query = conn.select("*", "t", None);
    query.where_("a = :a").bind_param(":a", ParamType::Int);
    let p = params(&[(":a", Value::Int(1))]);

    query.execute(&p).unwrap();
    assert!(query.is_prepared());
    query.execute(&p).unwrap();
    assert_eq!(client.0.borrow().prepared.len(), 1);
    assert_eq!(client.0.borrow().executed, 2);

    query.limit(1, None);
    assert!(!query.is_prepared());
    query.execute(&p).unwrap();

    let log = client.0.borrow();
    assert_eq!(log.prepared.len(), 2);
    assert_eq!(log.prepared[1], "SELECT * FROM t WHERE (a = :a) LIMIT 1");
}

#[test]
fn test_clone_select_keeps_clauses_with_new_items() {
    let (conn, client) = connection();
    let mut query = conn.select("*", "t", Some("tt"));
    query
        .left_join("j", Some("jj"), "jj.tid = tt.id")
        .where_("tt.a = :a")
        .order_by([OrderTerm::desc("tt.id")])
        .limit(5, Some(10))
        .bind_param(":a", ParamType::Int);

    let mut count = query.clone_select("count(*) as count");
    assert_eq!(
        count.to_sql(),
        "SELECT count(*) as count FROM t tt LEFT OUTER JOIN j jj ON jj.tid = tt.id \
         WHERE (tt.a = :a) ORDER BY tt.id DESC LIMIT 10, 5"
    );
    assert_eq!(count.params(), query.params());

    count.execute(&params(&[(":a", Value::Int(1))])).unwrap();
    assert!(count.is_prepared());
    assert!(!query.is_prepared());
    assert_eq!(client.0.borrow().prepared.len(), 1);

    count.limit(1, None);
    assert!(query.to_sql().ends_with("LIMIT 10, 5"));
}

#[test]
fn test_clear_limit_drops_clause_and_statement() {
    let (conn, _client) = connection();
    let mut query = conn.select("*", "t", None);
    query.where_("a = :a").limit(5, Some(10)).bind_param(":a", ParamType::Int);

    query.execute(&params(&[(":a", Value::Int(1))])).unwrap();
    assert!(query.is_prepared());

    query.clear_limit();
    assert!(!query.is_prepared());
    assert_eq!(query.to_sql(), "SELECT * FROM t WHERE (a = :a)");
}

#[test]
fn test_raw_query_guard_and_fetch() {
    let (conn, client) = connection();
    let mut raw = conn.raw_query("SELECT * FROM t WHERE a = :a AND b = :b", true);
    raw.bind_params([(":a", ParamType::Int), (":b", ParamType::String)]);

    assert!(raw.execute(&params(&[(":a", Value::Int(1))])).unwrap_err().is_data());

    let rows = raw
        .execute(&params(&[(":a", Value::Int(1)), (":b", Value::from("x"))]))
        .unwrap();
    assert_eq!(rows, Some(vec![]));
    assert_eq!(client.0.borrow().prepared, vec![raw.to_sql().to_string()]);

    let mut write = conn.raw_query("DELETE FROM t", false);
    assert_eq!(write.execute(&Params::new()).unwrap(), None);
}
