//! JSON-lines automation driver.
//!
//! One request object per input line, one response object per output line.
//! Every request maps onto a single [`Engine`] call; the driver has no other
//! way to touch the session.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::engine::{AnswerReport, Engine};
use crate::error::{GameError, GameResult};
use crate::session::{FinalResult, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Start,
    State,
    Answer { option: usize },
    End,
    Debug { enabled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SessionSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<FinalResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    fn ok() -> Self {
        Self {
            status: Status::Ok,
            snapshot: None,
            answer: None,
            result: None,
            debug: None,
            kind: None,
            message: None,
        }
    }

    fn snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::ok()
        }
    }

    fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            kind: Some(kind.to_string()),
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    fn from_error(err: &GameError) -> Self {
        Self::error(err.kind(), err.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

pub struct HeadlessDriver<C: Clock> {
    engine: Engine<C>,
}

impl<C: Clock> HeadlessDriver<C> {
    pub fn new(engine: Engine<C>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine<C> {
        &self.engine
    }

    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Start => Response::snapshot(self.engine.start_session()),
            Request::State => {
                self.engine.pump();
                Response::snapshot(self.engine.get_snapshot())
            }
            Request::Answer { option } => match self.engine.submit_answer(option) {
                Ok(report) => Response {
                    answer: Some(report),
                    ..Response::ok()
                },
                Err(err) => Response::from_error(&err),
            },
            Request::End => match self.engine.end_session() {
                Ok(result) => Response {
                    result: Some(result),
                    ..Response::ok()
                },
                Err(err) => Response::from_error(&err),
            },
            Request::Debug { enabled } => {
                self.engine.set_debug(enabled);
                Response {
                    debug: Some(enabled),
                    ..Response::ok()
                }
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(err) => Response::error("bad_request", err.to_string()),
        }
    }

    /// Serve requests until the input is exhausted. Blank lines are skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> GameResult<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response)?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
        Ok(())
    }
}
