//! CSV record source and ordered graph construction.
//!
//! Tables are consumed in dependency order: permissions, resources, users,
//! groups, then entitlements. Group memberships named on user rows are bound
//! in a second pass once the group table has been read, so the users file
//! does not need to trail the groups file. Within each table, rows apply in
//! file order; resource rows in particular must arrive parent-first.

use std::path::Path;

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::graph::{Application, GraphError, GrantScope, PropertyType};
use crate::records::{
    parse_access_levels, parse_bool_token, split_multi, EntitlementRow, GroupRow, PermissionRow,
    ResourceRow, UserRow, RESERVED_USER_COLUMNS,
};

pub const PERMISSIONS_TABLE: &str = "permissions.csv";
pub const RESOURCES_TABLE: &str = "resources.csv";
pub const USERS_TABLE: &str = "users.csv";
pub const GROUPS_TABLE: &str = "groups.csv";
pub const ENTITLEMENTS_TABLE: &str = "identity_to_permissions.csv";

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("failed to read {table}")]
    #[diagnostic(
        code(orrery::ingest::read),
        help("check that the csv directory contains all five tables")
    )]
    Read {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("{table} row {row}: {source}")]
    #[diagnostic(code(orrery::ingest::row))]
    Row {
        table: String,
        row: usize,
        #[source]
        source: GraphError,
    },

    #[error("{table} row {row}: unknown identity type `{token}`")]
    #[diagnostic(
        code(orrery::ingest::identity_type),
        help("identity_type must be `local_user` or `local_group`")
    )]
    UnknownIdentityType {
        table: String,
        row: usize,
        token: String,
    },

    #[error("{table} row {row}: unrecognized is_active value `{token}`")]
    #[diagnostic(
        code(orrery::ingest::boolean),
        help("use true/false, yes/no, or 1/0")
    )]
    InvalidBoolean {
        table: String,
        row: usize,
        token: String,
    },
}

/// Build a full [`Application`] from the five tables under `dir`.
pub fn load_application(
    dir: &Path,
    name: &str,
    application_type: &str,
    description: Option<&str>,
) -> Result<Application, IngestError> {
    let mut app = Application::new(name, application_type);
    app.description = description.map(str::to_string);

    load_permissions(dir, &mut app)?;
    load_resources(dir, &mut app)?;
    let memberships = load_users(dir, &mut app)?;
    load_groups(dir, &mut app)?;
    bind_memberships(&mut app, memberships)?;
    load_entitlements(dir, &mut app)?;

    tracing::info!(
        permissions = app.permissions.len(),
        resources = app.resources.len(),
        users = app.identities.users.len(),
        groups = app.identities.groups.len(),
        "ingested authorization tables"
    );
    Ok(app)
}

/// A group membership parked until the group table has been read.
struct Membership {
    user: String,
    group: String,
    row: usize,
}

fn read_rows<T: DeserializeOwned>(dir: &Path, table: &str) -> Result<Vec<T>, IngestError> {
    let mut reader = csv::Reader::from_path(dir.join(table)).map_err(|source| IngestError::Read {
        table: table.to_string(),
        source,
    })?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result.map_err(|source| IngestError::Read {
            table: table.to_string(),
            source,
        })?);
    }
    tracing::debug!(table, rows = rows.len(), "read table");
    Ok(rows)
}

fn row_error(table: &str, index: usize, source: GraphError) -> IngestError {
    IngestError::Row {
        table: table.to_string(),
        row: index + 1,
        source,
    }
}

fn load_permissions(dir: &Path, app: &mut Application) -> Result<(), IngestError> {
    let rows: Vec<PermissionRow> = read_rows(dir, PERMISSIONS_TABLE)?;
    for (index, row) in rows.iter().enumerate() {
        parse_access_levels(&row.permissions)
            .and_then(|levels| app.permissions.register(&row.name, levels))
            .map_err(|source| row_error(PERMISSIONS_TABLE, index, source))?;
    }
    Ok(())
}

fn load_resources(dir: &Path, app: &mut Application) -> Result<(), IngestError> {
    let rows: Vec<ResourceRow> = read_rows(dir, RESOURCES_TABLE)?;
    for (index, row) in rows.iter().enumerate() {
        let result = match row.parent() {
            Some(parent) => {
                app.resources
                    .add_child(parent, &row.name, &row.resource_type, row.description())
            }
            None => app
                .resources
                .add_root(&row.name, &row.resource_type, row.description()),
        };
        result.map_err(|source| row_error(RESOURCES_TABLE, index, source))?;
    }
    Ok(())
}

fn load_users(dir: &Path, app: &mut Application) -> Result<Vec<Membership>, IngestError> {
    let mut reader =
        csv::Reader::from_path(dir.join(USERS_TABLE)).map_err(|source| IngestError::Read {
            table: USERS_TABLE.to_string(),
            source,
        })?;

    // Every non-reserved header is declared as a string property up front,
    // whether or not any row fills it in.
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Read {
            table: USERS_TABLE.to_string(),
            source,
        })?
        .clone();
    for header in headers.iter() {
        if !RESERVED_USER_COLUMNS.contains(&header) {
            app.property_definitions
                .define_user_property(header, PropertyType::String);
        }
    }

    let mut memberships = Vec::new();
    for (index, result) in reader.deserialize::<UserRow>().enumerate() {
        let row = result.map_err(|source| IngestError::Read {
            table: USERS_TABLE.to_string(),
            source,
        })?;

        app.identities
            .add_user(&row.name)
            .map_err(|source| row_error(USERS_TABLE, index, source))?;

        if !row.identity.is_empty() {
            app.identities
                .add_identity_alias(&row.name, &row.identity)
                .map_err(|source| row_error(USERS_TABLE, index, source))?;
        }

        for (key, value) in row.custom_properties() {
            app.identities
                .set_property(&row.name, key, Value::String(value.to_string()))
                .map_err(|source| row_error(USERS_TABLE, index, source))?;
        }

        if !row.is_active.is_empty() {
            let active =
                parse_bool_token(&row.is_active).ok_or_else(|| IngestError::InvalidBoolean {
                    table: USERS_TABLE.to_string(),
                    row: index + 1,
                    token: row.is_active.clone(),
                })?;
            app.identities
                .set_active(&row.name, active)
                .map_err(|source| row_error(USERS_TABLE, index, source))?;
        }

        for group in split_multi(&row.groups) {
            memberships.push(Membership {
                user: row.name.clone(),
                group: group.to_string(),
                row: index + 1,
            });
        }
    }
    Ok(memberships)
}

fn load_groups(dir: &Path, app: &mut Application) -> Result<(), IngestError> {
    let rows: Vec<GroupRow> = read_rows(dir, GROUPS_TABLE)?;
    for (index, row) in rows.iter().enumerate() {
        app.identities
            .add_group(&row.name)
            .map_err(|source| row_error(GROUPS_TABLE, index, source))?;
    }
    Ok(())
}

fn bind_memberships(
    app: &mut Application,
    memberships: Vec<Membership>,
) -> Result<(), IngestError> {
    for membership in memberships {
        app.identities
            .add_group_membership(&membership.user, &membership.group)
            .map_err(|source| IngestError::Row {
                table: USERS_TABLE.to_string(),
                row: membership.row,
                source,
            })?;
    }
    Ok(())
}

fn load_entitlements(dir: &Path, app: &mut Application) -> Result<(), IngestError> {
    let rows: Vec<EntitlementRow> = read_rows(dir, ENTITLEMENTS_TABLE)?;
    for (index, row) in rows.iter().enumerate() {
        let identity = row
            .identity_ref()
            .map_err(|token| IngestError::UnknownIdentityType {
                table: ENTITLEMENTS_TABLE.to_string(),
                row: index + 1,
                token,
            })?;
        let scope = if row.resource_name.is_empty() {
            GrantScope::Application
        } else {
            GrantScope::resources([row.resource_name.as_str()])
        };
        app.grant(&identity, &row.permission, scope)
            .map_err(|source| row_error(ENTITLEMENTS_TABLE, index, source))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        /// Five tables with headers and no data rows.
        fn empty() -> Self {
            let fixture = Fixture {
                dir: TempDir::new().unwrap(),
            };
            fixture.write(PERMISSIONS_TABLE, "name,permissions\n");
            fixture.write(RESOURCES_TABLE, "name,resource_type,parent_name,description\n");
            fixture.write(USERS_TABLE, "name,identity,groups,is_active\n");
            fixture.write(GROUPS_TABLE, "name\n");
            fixture.write(
                ENTITLEMENTS_TABLE,
                "identity,identity_type,permission,resource_name\n",
            );
            fixture
        }

        fn write(&self, table: &str, contents: &str) {
            fs::write(self.dir.path().join(table), contents).unwrap();
        }

        fn load(&self) -> Result<Application, IngestError> {
            load_application(self.dir.path(), "Orbit CRM", "crm", None)
        }
    }

    #[test]
    fn test_full_directory_builds_graph() {
        let fixture = Fixture::empty();
        fixture.write(
            PERMISSIONS_TABLE,
            "name,permissions\nView,DataRead\nEdit,DataRead;DataWrite\n",
        );
        fixture.write(
            RESOURCES_TABLE,
            "name,resource_type,parent_name,description\n\
             Branch,branch,,Main branch\n\
             Sales,department,Branch,\n",
        );
        fixture.write(
            USERS_TABLE,
            "name,identity,department,groups,is_active\n\
             alice,alice@example.com,Sales,staff,true\n\
             bob,,,staff;admins,no\n",
        );
        fixture.write(GROUPS_TABLE, "name\nstaff\nadmins\n");
        fixture.write(
            ENTITLEMENTS_TABLE,
            "identity,identity_type,permission,resource_name\n\
             alice,local_user,Edit,Sales\n\
             staff,local_group,View,\n",
        );

        let app = fixture.load().unwrap();
        assert_eq!(app.permissions.len(), 2);
        assert_eq!(app.resources.len(), 2);
        assert_eq!(app.identities.users.len(), 2);
        assert_eq!(app.identities.groups.len(), 2);

        let alice = app.identities.user("alice").unwrap();
        assert_eq!(alice.identities, vec!["alice@example.com"]);
        assert_eq!(alice.properties["department"], "Sales");
        assert!(alice.is_active);
        assert_eq!(alice.groups, vec!["staff"]);
        assert_eq!(alice.entitlements.len(), 1);

        let bob = app.identities.user("bob").unwrap();
        assert!(!bob.is_active);
        assert_eq!(bob.groups, vec!["staff", "admins"]);

        let staff = app.identities.group("staff").unwrap();
        assert!(matches!(
            staff.entitlements[0].scope,
            GrantScope::Application
        ));

        assert_eq!(
            app.property_definitions.user_properties.get("department"),
            Some(&PropertyType::String)
        );
    }

    #[test]
    fn test_memberships_bind_after_groups_table() {
        let fixture = Fixture::empty();
        fixture.write(USERS_TABLE, "name,identity,groups,is_active\ncarol,,ops,\n");
        fixture.write(GROUPS_TABLE, "name\nops\n");

        let app = fixture.load().unwrap();
        assert_eq!(app.identities.user("carol").unwrap().groups, vec!["ops"]);
    }

    #[test]
    fn test_child_before_parent_fails_with_row_context() {
        let fixture = Fixture::empty();
        fixture.write(
            RESOURCES_TABLE,
            "name,resource_type,parent_name,description\n\
             Sales,department,Branch,\n\
             Branch,branch,,\n",
        );

        let err = fixture.load().unwrap_err();
        match err {
            IngestError::Row { table, row, source } => {
                assert_eq!(table, RESOURCES_TABLE);
                assert_eq!(row, 1);
                assert!(matches!(source, GraphError::UnresolvedParent { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_access_level_token_fails_with_row_context() {
        let fixture = Fixture::empty();
        fixture.write(
            PERMISSIONS_TABLE,
            "name,permissions\nView,DataRead\nEdit,DataRead;Sudo\n",
        );

        let err = fixture.load().unwrap_err();
        match err {
            IngestError::Row { table, row, source } => {
                assert_eq!(table, PERMISSIONS_TABLE);
                assert_eq!(row, 2);
                assert!(matches!(
                    source,
                    GraphError::InvalidAccessLevel { token } if token == "Sudo"
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_identity_type_names_token() {
        let fixture = Fixture::empty();
        fixture.write(
            ENTITLEMENTS_TABLE,
            "identity,identity_type,permission,resource_name\nr2d2,service_account,View,\n",
        );

        let err = fixture.load().unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnknownIdentityType { row: 1, ref token, .. } if token == "service_account"
        ));
    }

    #[test]
    fn test_bad_is_active_token_is_rejected() {
        let fixture = Fixture::empty();
        fixture.write(USERS_TABLE, "name,identity,groups,is_active\ndave,,,maybe\n");

        let err = fixture.load().unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidBoolean { row: 1, ref token, .. } if token == "maybe"
        ));
    }

    #[test]
    fn test_missing_table_is_read_error() {
        let fixture = Fixture::empty();
        fs::remove_file(fixture.dir.path().join(GROUPS_TABLE)).unwrap();

        let err = fixture.load().unwrap_err();
        assert!(matches!(err, IngestError::Read { ref table, .. } if table == GROUPS_TABLE));
    }
}
