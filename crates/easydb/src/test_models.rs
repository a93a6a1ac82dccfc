//! Hand-written models and a scripted driver shared by unit tests.

use crate::command::Command;
use crate::driver::{Connection, ConnectionState, Driver, Row};
use crate::error::{DbResult, DriverError, Phase};
use crate::model::{Model, ModelDescriptor, PropertyDescriptor};
use crate::value::{ScalarValue, Value};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub views: i32,
    pub preview: String,
    pub author_id: Option<i64>,
}

static POST: ModelDescriptor = ModelDescriptor {
    type_name: "Post",
    table_name: "posts",
    properties: &[
        PropertyDescriptor::new("id", <i64 as ScalarValue>::KIND, false)
            .key()
            .generated(),
        PropertyDescriptor::new("title", <String as ScalarValue>::KIND, false),
        PropertyDescriptor::new("content", <Option<String> as ScalarValue>::KIND, true)
            .column("body"),
        PropertyDescriptor::new("views", <i32 as ScalarValue>::KIND, false),
        PropertyDescriptor::new("preview", <String as ScalarValue>::KIND, false).ignored(),
        PropertyDescriptor::new("author_id", <Option<i64> as ScalarValue>::KIND, true),
    ],
};

impl Model for Post {
    fn descriptor() -> &'static ModelDescriptor {
        &POST
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        Some(match name {
            "id" => self.id.to_value(),
            "title" => self.title.to_value(),
            "content" => self.content.to_value(),
            "views" => self.views.to_value(),
            "preview" => self.preview.to_value(),
            "author_id" => self.author_id.to_value(),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: Value) -> DbResult<bool> {
        use crate::value::FromValue;
        match name {
            "id" => self.id = FromValue::from_value(value)?,
            "title" => self.title = FromValue::from_value(value)?,
            "content" => self.content = FromValue::from_value(value)?,
            "views" => self.views = FromValue::from_value(value)?,
            "preview" => self.preview = FromValue::from_value(value)?,
            "author_id" => self.author_id = FromValue::from_value(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Model with a non-key, non-generated layout and no overrides.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub code: String,
    pub label: String,
}

static TAG: ModelDescriptor = ModelDescriptor {
    type_name: "Tag",
    table_name: "tags",
    properties: &[
        PropertyDescriptor::new("code", <String as ScalarValue>::KIND, false).key(),
        PropertyDescriptor::new("label", <String as ScalarValue>::KIND, false),
    ],
};

impl Model for Tag {
    fn descriptor() -> &'static ModelDescriptor {
        &TAG
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "code" => Some(self.code.to_value()),
            "label" => Some(self.label.to_value()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> DbResult<bool> {
        use crate::value::FromValue;
        match name {
            "code" => self.code = FromValue::from_value(value)?,
            "label" => self.label = FromValue::from_value(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Scripted driver recording every connection call.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    pub state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub log: Vec<String>,
    pub fail_on: Option<Phase>,
    pub rows: Vec<Row>,
    pub affected: u64,
    pub scalar: Value,
    pub commands: Vec<Command>,
}

impl MockDriver {
    pub fn failing(phase: Phase) -> Self {
        let driver = Self::default();
        driver.lock().fail_on = Some(phase);
        driver
    }

    pub fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }
}

struct MockConnection {
    shared: Arc<Mutex<MockState>>,
    open: bool,
}

impl MockConnection {
    fn step(&self, name: &str, phase: Phase) -> Result<(), DriverError> {
        let mut state = self.shared.lock().unwrap();
        state.log.push(name.to_string());
        if state.fail_on == Some(phase) {
            return Err(format!("{name} failed").into());
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn open(&mut self) -> Result<(), DriverError> {
        self.step("open", Phase::Open)?;
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.step("close", Phase::Close)?;
        self.open = false;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        if self.open {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn create_command(&self, command: &Command) -> Result<(), DriverError> {
        self.shared.lock().unwrap().commands.push(command.clone());
        self.step("create_command", Phase::CreateCommand)
    }

    async fn query(
        &mut self,
        _command: &Command,
    ) -> Result<Vec<Row>, DriverError> {
        self.step("query", Phase::ReadAll)?;
        Ok(self.shared.lock().unwrap().rows.clone())
    }

    async fn execute(&mut self, _command: &Command) -> Result<u64, DriverError> {
        self.step("execute", Phase::NonQuery)?;
        Ok(self.shared.lock().unwrap().affected)
    }

    async fn scalar(&mut self, _command: &Command) -> Result<Value, DriverError> {
        self.step("scalar", Phase::Scalar)?;
        Ok(self.shared.lock().unwrap().scalar.clone())
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn provider(&self) -> &str {
        "sqlserver"
    }

    async fn connect(
        &self,
        _connection_string: &str,
    ) -> Result<Box<dyn Connection>, DriverError> {
        self.lock().log.push("connect".to_string());
        if self.lock().fail_on == Some(Phase::Config) {
            return Err("connect failed".into());
        }
        Ok(Box::new(MockConnection {
            shared: Arc::clone(&self.state),
            open: false,
        }))
    }
}
