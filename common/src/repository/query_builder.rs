use mongodb::bson::{doc, Bson, Document};

/// 过滤条件构造器，生成 MongoDB 查询文档
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    clauses: Vec<Document>,
    current: Document,
    logic_op: Option<&'static str>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.current.insert(field, value.into());
        self
    }

    /// 值为“真”时才追加等值条件，0 / None 视为不过滤
    pub fn eq_if_truthy(self, field: &str, value: Option<i64>) -> Self {
        match value {
            Some(v) if v != 0 => self.eq(field, v),
            _ => self,
        }
    }

    pub fn gt(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.current.insert(field, doc! { "$gt": value.into() });
        self
    }

    pub fn in_array<T: Into<Bson>>(mut self, field: &str, values: Vec<T>) -> Self {
        let arr = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.current.insert(field, doc! { "$in": arr });
        self
    }

    /// 用另一份条件覆盖当前条件，同名字段以 `other` 为准
    pub fn overlay(mut self, other: Document) -> Self {
        for (key, value) in other {
            self.current.insert(key, value);
        }
        self
    }

    pub fn and(mut self) -> Self {
        self.logic_op = Some("$and");
        self.clauses.push(self.current);
        self.current = Document::new();
        self
    }

    pub fn or(mut self) -> Self {
        self.logic_op = Some("$or");
        self.clauses.push(self.current);
        self.current = Document::new();
        self
    }

    pub fn build(mut self) -> Document {
        if !self.current.is_empty() {
            self.clauses.push(self.current);
        }
        match self.logic_op {
            Some(op) => doc! { op: self.clauses },
            None if self.clauses.len() == 1 => self.clauses.remove(0),
            None => doc! {},
        }
    }
}

/// 把 `"_id title startTime"` 形式的字段列表转为投影文档
pub fn select_fields(select: &str) -> Option<Document> {
    let mut projection = Document::new();
    for field in select.split_whitespace() {
        match field.strip_prefix('-') {
            Some(excluded) => projection.insert(excluded, 0),
            None => projection.insert(field, 1),
        };
    }
    if projection.is_empty() { None } else { Some(projection) }
}
