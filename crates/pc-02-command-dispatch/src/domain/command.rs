//! Typed commands.
//!
//! Each surface has one enum with a variant per command name. Decoding maps
//! `(name, ArgList)` to a variant; names a surface does not know decode to
//! `None` and are ignored by the bridge.

use serde_json::Value;

use super::args::ArgList;
use super::browser::{TabId, WindowId};
use crate::error::DispatchError;

/// A command that can be decoded from an outbound message.
pub trait DispatchCommand: Sized + Send + 'static {
    /// Every command name this type decodes.
    const NAMES: &'static [&'static str];

    /// Decode a command. `Ok(None)` for names not in [`Self::NAMES`].
    fn decode(name: &str, args: ArgList) -> Result<Option<Self>, DispatchError>;

    /// The command name, for logs.
    fn name(&self) -> &'static str;
}

/// Commands accepted by the windows surface.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    /// Reply with an `allWindows` snapshot.
    GetAll,
    Create { data: Option<Value> },
    Remove { window: WindowId },
    Update { window: WindowId, info: Value },
}

impl DispatchCommand for WindowCommand {
    const NAMES: &'static [&'static str] = &["getAll", "create", "remove", "update"];

    fn decode(name: &str, args: ArgList) -> Result<Option<Self>, DispatchError> {
        let command = match name {
            "getAll" => Self::GetAll,
            "create" => Self::Create {
                data: args.optional("create", 0)?,
            },
            "remove" => Self::Remove {
                window: WindowId(args.required("remove", 0)?),
            },
            "update" => Self::Update {
                window: WindowId(args.required("update", 0)?),
                info: args.required("update", 1)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::GetAll => "getAll",
            Self::Create { .. } => "create",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
        }
    }
}

/// Commands accepted by the tabs surface.
///
/// Where the host call takes an optional leading tab id (defaulting to the
/// active tab) the variant carries `Option<TabId>`.
#[derive(Debug, Clone, PartialEq)]
pub enum TabCommand {
    Connect {
        tab: TabId,
        info: Option<Value>,
    },
    SendMessage {
        tab: TabId,
        message: Value,
        options: Option<Value>,
    },
    Create {
        properties: Value,
    },
    Duplicate {
        tab: TabId,
    },
    Update {
        tab: Option<TabId>,
        properties: Value,
    },
    Move {
        tabs: Vec<TabId>,
        properties: Value,
    },
    Reload {
        tab: Option<TabId>,
        properties: Option<Value>,
    },
    Remove {
        tabs: Vec<TabId>,
    },
    ExecuteScript {
        tab: Option<TabId>,
        details: Value,
    },
    InsertCss {
        tab: Option<TabId>,
        details: Value,
    },
    SetZoom {
        tab: Option<TabId>,
        factor: f64,
    },
    SetZoomSettings {
        tab: Option<TabId>,
        settings: Value,
    },
}

impl DispatchCommand for TabCommand {
    const NAMES: &'static [&'static str] = &[
        "connect",
        "sendMessage",
        "create",
        "duplicate",
        "update",
        "move",
        "reload",
        "remove",
        "executeScript",
        "insertCSS",
        "setZoom",
        "setZoomSettings",
    ];

    fn decode(name: &str, args: ArgList) -> Result<Option<Self>, DispatchError> {
        let command = match name {
            "connect" => Self::Connect {
                tab: TabId(args.required("connect", 0)?),
                info: args.optional("connect", 1)?,
            },
            "sendMessage" => Self::SendMessage {
                tab: TabId(args.required("sendMessage", 0)?),
                message: args.get(1).cloned().unwrap_or(Value::Null),
                options: args.optional("sendMessage", 2)?,
            },
            "create" => Self::Create {
                properties: args.required("create", 0)?,
            },
            "duplicate" => Self::Duplicate {
                tab: TabId(args.required("duplicate", 0)?),
            },
            "update" => {
                let (tab, rest) = args.leading_id();
                Self::Update {
                    tab: tab.map(TabId),
                    properties: rest.required("update", 0)?,
                }
            }
            "move" => Self::Move {
                tabs: ids(args.one_or_many("move", 0)?),
                properties: args.required("move", 1)?,
            },
            "reload" => {
                let (tab, rest) = args.leading_id();
                Self::Reload {
                    tab: tab.map(TabId),
                    properties: rest.optional("reload", 0)?,
                }
            }
            "remove" => Self::Remove {
                tabs: ids(args.one_or_many("remove", 0)?),
            },
            "executeScript" => {
                let (tab, rest) = args.leading_id();
                Self::ExecuteScript {
                    tab: tab.map(TabId),
                    details: rest.required("executeScript", 0)?,
                }
            }
            "insertCSS" => {
                let (tab, rest) = args.leading_id();
                Self::InsertCss {
                    tab: tab.map(TabId),
                    details: rest.required("insertCSS", 0)?,
                }
            }
            "setZoom" => {
                // The factor itself may be an integer, so only treat the
                // first argument as a tab id when a second one follows.
                let (tab, rest) = if args.len() > 1 {
                    args.leading_id()
                } else {
                    (None, args)
                };
                Self::SetZoom {
                    tab: tab.map(TabId),
                    factor: rest.required("setZoom", 0)?,
                }
            }
            "setZoomSettings" => {
                let (tab, rest) = args.leading_id();
                Self::SetZoomSettings {
                    tab: tab.map(TabId),
                    settings: rest.required("setZoomSettings", 0)?,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::SendMessage { .. } => "sendMessage",
            Self::Create { .. } => "create",
            Self::Duplicate { .. } => "duplicate",
            Self::Update { .. } => "update",
            Self::Move { .. } => "move",
            Self::Reload { .. } => "reload",
            Self::Remove { .. } => "remove",
            Self::ExecuteScript { .. } => "executeScript",
            Self::InsertCss { .. } => "insertCSS",
            Self::SetZoom { .. } => "setZoom",
            Self::SetZoomSettings { .. } => "setZoomSettings",
        }
    }
}

fn ids(raw: Vec<i64>) -> Vec<TabId> {
    raw.into_iter().map(TabId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_tab(name: &str, payload: Value) -> Result<Option<TabCommand>, DispatchError> {
        TabCommand::decode(name, ArgList::from_payload(payload))
    }

    #[test]
    fn test_unknown_name_is_none() {
        assert_eq!(WindowCommand::decode("explode", ArgList::default()), Ok(None));
        assert_eq!(decode_tab("getAll", json!([])), Ok(None));
    }

    #[test]
    fn test_window_commands() {
        assert_eq!(
            WindowCommand::decode("getAll", ArgList::default()),
            Ok(Some(WindowCommand::GetAll))
        );
        assert_eq!(
            WindowCommand::decode("update", ArgList::from_payload(json!([3, {"focused": true}]))),
            Ok(Some(WindowCommand::Update {
                window: WindowId(3),
                info: json!({"focused": true})
            }))
        );
        assert_eq!(
            WindowCommand::decode("create", ArgList::default()),
            Ok(Some(WindowCommand::Create { data: None }))
        );
    }

    #[test]
    fn test_window_remove_requires_id() {
        assert_eq!(
            WindowCommand::decode("remove", ArgList::default()),
            Err(DispatchError::MissingArgument {
                command: "remove",
                index: 0
            })
        );
    }

    #[test]
    fn test_tab_update_with_and_without_id() {
        assert_eq!(
            decode_tab("update", json!([7, {"active": true}])),
            Ok(Some(TabCommand::Update {
                tab: Some(TabId(7)),
                properties: json!({"active": true})
            }))
        );
        assert_eq!(
            decode_tab("update", json!([{"muted": true}])),
            Ok(Some(TabCommand::Update {
                tab: None,
                properties: json!({"muted": true})
            }))
        );
    }

    #[test]
    fn test_tab_remove_one_or_many() {
        assert_eq!(
            decode_tab("remove", json!(4)),
            Ok(Some(TabCommand::Remove {
                tabs: vec![TabId(4)]
            }))
        );
        assert_eq!(
            decode_tab("remove", json!([[4, 5]])),
            Ok(Some(TabCommand::Remove {
                tabs: vec![TabId(4), TabId(5)]
            }))
        );
    }

    #[test]
    fn test_set_zoom_factor_only() {
        assert_eq!(
            decode_tab("setZoom", json!([2])),
            Ok(Some(TabCommand::SetZoom {
                tab: None,
                factor: 2.0
            }))
        );
        assert_eq!(
            decode_tab("setZoom", json!([3, 1.5])),
            Ok(Some(TabCommand::SetZoom {
                tab: Some(TabId(3)),
                factor: 1.5
            }))
        );
    }

    #[test]
    fn test_every_name_decodes_or_reports() {
        for name in TabCommand::NAMES {
            // Missing arguments are an error, never an unknown command.
            match decode_tab(name, json!([])) {
                Ok(Some(command)) => assert_eq!(command.name(), *name),
                Ok(None) => panic!("{name} not recognised"),
                Err(_) => {}
            }
        }
    }
}
