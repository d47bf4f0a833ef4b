//! Static permission table
//!
//! The table maps each role to the resources it may touch and, per
//! resource, the allowed actions. It is built once on first use and only
//! read afterwards. Every lookup is fail-closed: a missing role, resource
//! or action yields `false`, never an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::role::{Role, Subject};

/// Protected resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Employe,
    Marche,
    Stock,
    Audit,
}

/// Actions on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Employe => "employe",
            Resource::Marche => "marche",
            Resource::Stock => "stock",
            Resource::Audit => "audit",
        }
    }
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown resource or action names
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown name: {0}")]
pub struct ParseNameError(pub String);

impl FromStr for Resource {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Resource::User),
            "employe" => Ok(Resource::Employe),
            "marche" => Ok(Resource::Marche),
            "stock" => Ok(Resource::Stock),
            "audit" => Ok(Resource::Audit),
            other => Err(ParseNameError(other.to_string())),
        }
    }
}

impl FromStr for Action {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(ParseNameError(other.to_string())),
        }
    }
}

type PermissionTable = HashMap<Role, HashMap<Resource, HashSet<Action>>>;

const CRUD: &[Action] = &[Action::Create, Action::Read, Action::Update, Action::Delete];
const CRU: &[Action] = &[Action::Create, Action::Read, Action::Update];
const R: &[Action] = &[Action::Read];

type Grants = &'static [(Resource, &'static [Action])];

const ADMIN: Grants = &[
    (Resource::User, CRUD),
    (Resource::Employe, CRUD),
    (Resource::Marche, CRUD),
    (Resource::Stock, CRUD),
    (Resource::Audit, R),
];

const MANAGER: Grants = &[
    (Resource::User, R),
    (Resource::Employe, CRU),
    (Resource::Marche, CRU),
    (Resource::Stock, CRU),
    (Resource::Audit, R),
];

const USER: Grants = &[
    (Resource::Employe, R),
    (Resource::Marche, R),
    (Resource::Stock, R),
];

fn build_table() -> PermissionTable {
    let grants: [(Role, Grants); 3] = [
        (Role::Admin, ADMIN),
        (Role::Manager, MANAGER),
        (Role::User, USER),
    ];

    grants
        .iter()
        .map(|(role, resources)| {
            let resources: HashMap<Resource, HashSet<Action>> = resources
                .iter()
                .map(|(resource, actions)| (*resource, actions.iter().copied().collect()))
                .collect();
            (*role, resources)
        })
        .collect()
}

fn table() -> &'static PermissionTable {
    static TABLE: OnceLock<PermissionTable> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn allows(role: Role, resource: Resource, action: Action) -> bool {
    table()
        .get(&role)
        .and_then(|resources| resources.get(&resource))
        .is_some_and(|actions| actions.contains(&action))
}

/// Check whether `user` may perform `action` on `resource`
pub fn has_permission<S: Subject + ?Sized>(
    user: Option<&S>,
    resource: Resource,
    action: Action,
) -> bool {
    match user {
        Some(user) => allows(user.role(), resource, action),
        None => false,
    }
}

/// Same as [`has_permission`] but with resource and action given by name,
/// for callers outside the services that hold plain strings (front-end
/// gating data, scripts).
///
/// Unknown names are treated as missing table entries.
pub fn has_permission_named<S: Subject + ?Sized>(
    user: Option<&S>,
    resource: &str,
    action: &str,
) -> bool {
    match (resource.parse::<Resource>(), action.parse::<Action>()) {
        (Ok(resource), Ok(action)) => has_permission(user, resource, action),
        _ => false,
    }
}

/// Resource → allowed actions for a role, in a stable order.
///
/// Resources the role has no entry for are omitted.
pub fn permissions_for(role: Role) -> BTreeMap<Resource, BTreeSet<Action>> {
    table()
        .get(&role)
        .map(|resources| {
            resources
                .iter()
                .map(|(resource, actions)| (*resource, actions.iter().copied().collect()))
                .collect()
        })
        .unwrap_or_default()
}
