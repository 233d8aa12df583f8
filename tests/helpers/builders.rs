use std::fs;
use std::path::Path;

use orrery::graph::{AccessLevel, Application, GrantScope, IdentityRef};
use tempfile::TempDir;

/// Builder for assembling in-memory test applications
pub struct AppBuilder {
    app: Application,
}

impl AppBuilder {
    pub fn new(name: &str, application_type: &str) -> Self {
        Self {
            app: Application::new(name, application_type),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.app.description = Some(description.to_string());
        self
    }

    pub fn with_permission(mut self, name: &str, levels: &[AccessLevel]) -> Self {
        self.app
            .permissions
            .register(name, levels.to_vec())
            .expect("Failed to register permission");
        self
    }

    pub fn with_resource(mut self, name: &str, resource_type: &str) -> Self {
        self.app
            .resources
            .add_root(name, resource_type, None)
            .expect("Failed to add resource");
        self
    }

    pub fn with_child_resource(mut self, parent: &str, name: &str, resource_type: &str) -> Self {
        self.app
            .resources
            .add_child(parent, name, resource_type, None)
            .expect("Failed to add child resource");
        self
    }

    pub fn with_user(mut self, name: &str) -> Self {
        self.app
            .identities
            .add_user(name)
            .expect("Failed to add user");
        self
    }

    pub fn with_group(mut self, name: &str) -> Self {
        self.app
            .identities
            .add_group(name)
            .expect("Failed to add group");
        self
    }

    pub fn with_user_alias(mut self, user: &str, alias: &str) -> Self {
        self.app
            .identities
            .add_identity_alias(user, alias)
            .expect("Failed to add alias");
        self
    }

    pub fn with_user_property(mut self, user: &str, key: &str, value: &str) -> Self {
        self.app
            .identities
            .set_property(user, key, serde_json::Value::String(value.to_string()))
            .expect("Failed to set property");
        self
    }

    pub fn with_membership(mut self, user: &str, group: &str) -> Self {
        self.app
            .identities
            .add_group_membership(user, group)
            .expect("Failed to add membership");
        self
    }

    pub fn with_user_grant(mut self, user: &str, permission: &str, resources: &[&str]) -> Self {
        self.app
            .grant(
                &IdentityRef::user(user),
                permission,
                GrantScope::resources(resources.iter().copied()),
            )
            .expect("Failed to grant to user");
        self
    }

    pub fn with_user_app_grant(mut self, user: &str, permission: &str) -> Self {
        self.app
            .grant(&IdentityRef::user(user), permission, GrantScope::Application)
            .expect("Failed to grant to user");
        self
    }

    pub fn with_group_grant(mut self, group: &str, permission: &str, resources: &[&str]) -> Self {
        self.app
            .grant(
                &IdentityRef::group(group),
                permission,
                GrantScope::resources(resources.iter().copied()),
            )
            .expect("Failed to grant to group");
        self
    }

    pub fn with_group_app_grant(mut self, group: &str, permission: &str) -> Self {
        self.app
            .grant(&IdentityRef::group(group), permission, GrantScope::Application)
            .expect("Failed to grant to group");
        self
    }

    pub fn build(self) -> Application {
        self.app
    }
}

/// On-disk csv fixture directory with all five tables present. Starts with
/// header-only tables; individual tables can be replaced per test.
pub struct CsvFixture {
    dir: TempDir,
}

impl CsvFixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        };
        fixture.write("permissions.csv", "name,permissions\n");
        fixture.write(
            "resources.csv",
            "name,resource_type,parent_name,description\n",
        );
        fixture.write("users.csv", "name,identity,groups,is_active\n");
        fixture.write("groups.csv", "name\n");
        fixture.write(
            "identity_to_permissions.csv",
            "identity,identity_type,permission,resource_name\n",
        );
        fixture
    }

    pub fn with_table(self, table: &str, contents: &str) -> Self {
        self.write(table, contents);
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, table: &str, contents: &str) {
        fs::write(self.dir.path().join(table), contents).expect("Failed to write table");
    }
}

impl Default for CsvFixture {
    fn default() -> Self {
        Self::new()
    }
}
