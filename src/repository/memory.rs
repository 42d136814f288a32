//! In-memory repositories for service tests.

use super::{GroupRepository, RoleRepository, UserRepository};
use crate::error::AppError;
use crate::model::{
    GroupResponse, NewUser, RoleResponse, Rights, UserChanges, UserRecord, UserResponse,
};
use crate::service::{group_exists, user_exists, UserSearch};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, StoredUser>,
    groups: BTreeMap<Uuid, GroupResponse>,
    roles: BTreeMap<Uuid, RoleResponse>,
    /// (user, group)
    memberships: BTreeSet<(Uuid, Uuid)>,
}

impl Tables {
    fn users_sorted(&self, keep: impl Fn(&UserRecord) -> bool) -> Vec<UserResponse> {
        let mut users: Vec<UserResponse> = self
            .users
            .values()
            .map(|u| &u.record)
            .filter(|&r| keep(r))
            .cloned()
            .map(UserResponse::from)
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    /// Insert a user directly, skipping validation and hashing.
    pub fn seed_user(&self, name: &str, email: &str) -> Uuid {
        let uid = Uuid::new_v4();
        let record = UserRecord {
            uid,
            name: name.to_string(),
            email: email.to_string(),
            status: 1,
            role_rid: None,
        };
        self.lock().users.insert(
            uid,
            StoredUser {
                record,
                password_hash: "seeded".to_string(),
            },
        );
        uid
    }

    pub fn seed_group(&self, name: &str) -> Uuid {
        let gid = Uuid::new_v4();
        self.lock().groups.insert(
            gid,
            GroupResponse {
                gid,
                name: name.to_string(),
            },
        );
        gid
    }

    pub fn seed_role(&self, name: &str, rights: Rights) -> Uuid {
        let rid = Uuid::new_v4();
        self.lock().roles.insert(
            rid,
            RoleResponse {
                rid,
                name: name.to_string(),
                rights,
            },
        );
        rid
    }

    pub fn user(&self, uid: Uuid) -> Option<UserRecord> {
        self.lock().users.get(&uid).map(|u| u.record.clone())
    }

    pub fn password_hash(&self, uid: Uuid) -> Option<String> {
        self.lock().users.get(&uid).map(|u| u.password_hash.clone())
    }

    pub fn memberships(&self) -> Vec<(Uuid, Uuid)> {
        self.lock().memberships.iter().copied().collect()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    /// Ordering is always by name; `order_by` is SQL and only the Postgres store applies it.
    async fn search_users(&self, search: &UserSearch) -> Result<Vec<UserResponse>, AppError> {
        let needle = search
            .name_pattern
            .as_deref()
            .map(|p| p.trim_matches('%').replace('\\', "").to_lowercase());
        let mut users = self.lock().users_sorted(|u| match &needle {
            Some(n) => u.name.to_lowercase().contains(n.as_str()),
            None => true,
        });
        users.truncate(usize::try_from(search.limit).unwrap_or(0));
        Ok(users)
    }

    async fn find_user(&self, uid: Uuid) -> Result<Option<UserRecord>, AppError> {
        Ok(self.user(uid))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .users
            .values()
            .any(|u| u.record.email == email && Some(u.record.uid) != except))
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserResponse, AppError> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.record.email == user.email) {
            return Err(user_exists());
        }
        let record = UserRecord {
            uid: user.uid,
            name: user.name,
            email: user.email,
            status: user.status,
            role_rid: None,
        };
        tables.users.insert(
            user.uid,
            StoredUser {
                record: record.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(record.into())
    }

    async fn update_user(
        &self,
        uid: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, AppError> {
        let mut tables = self.lock();
        if tables
            .users
            .values()
            .any(|u| u.record.email == changes.email && u.record.uid != uid)
        {
            return Err(user_exists());
        }
        let Some(user) = tables.users.get_mut(&uid) else {
            return Ok(None);
        };
        user.record.name = changes.name;
        user.record.email = changes.email;
        user.record.status = changes.status;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.record.clone().into()))
    }

    async fn delete_user(&self, uid: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&uid) {
            return Ok(false);
        }
        tables.memberships.retain(|(u, _)| *u != uid);
        tables.users.remove(&uid);
        Ok(true)
    }

    async fn groups_of_user(&self, uid: Uuid) -> Result<Vec<GroupResponse>, AppError> {
        let tables = self.lock();
        let mut groups: Vec<GroupResponse> = tables
            .memberships
            .iter()
            .filter(|(u, _)| *u == uid)
            .filter_map(|(_, g)| tables.groups.get(g).cloned())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn add_membership(&self, uid: Uuid, gid: Uuid) -> Result<(), AppError> {
        self.lock().memberships.insert((uid, gid));
        Ok(())
    }

    async fn remove_membership(&self, uid: Uuid, gid: Uuid) -> Result<bool, AppError> {
        Ok(self.lock().memberships.remove(&(uid, gid)))
    }

    async fn set_user_role(&self, uid: Uuid, rid: Uuid) -> Result<(), AppError> {
        if let Some(user) = self.lock().users.get_mut(&uid) {
            user.record.role_rid = Some(rid);
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn list_groups(&self) -> Result<Vec<GroupResponse>, AppError> {
        let mut groups: Vec<GroupResponse> = self.lock().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn find_group(&self, gid: Uuid) -> Result<Option<GroupResponse>, AppError> {
        Ok(self.lock().groups.get(&gid).cloned())
    }

    async fn group_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .groups
            .values()
            .any(|g| g.name == name && Some(g.gid) != except))
    }

    async fn insert_group(&self, group: GroupResponse) -> Result<GroupResponse, AppError> {
        let mut tables = self.lock();
        if tables.groups.values().any(|g| g.name == group.name) {
            return Err(group_exists());
        }
        tables.groups.insert(group.gid, group.clone());
        Ok(group)
    }

    async fn rename_group(&self, gid: Uuid, name: &str) -> Result<Option<GroupResponse>, AppError> {
        let mut tables = self.lock();
        if tables.groups.values().any(|g| g.name == name && g.gid != gid) {
            return Err(group_exists());
        }
        Ok(tables.groups.get_mut(&gid).map(|g| {
            g.name = name.to_string();
            g.clone()
        }))
    }

    async fn delete_group(&self, gid: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if !tables.groups.contains_key(&gid) {
            return Ok(false);
        }
        tables.memberships.retain(|(_, g)| *g != gid);
        tables.groups.remove(&gid);
        Ok(true)
    }

    async fn members_of_group(&self, gid: Uuid) -> Result<Vec<UserResponse>, AppError> {
        let tables = self.lock();
        let members: BTreeSet<Uuid> = tables
            .memberships
            .iter()
            .filter(|(_, g)| *g == gid)
            .map(|(u, _)| *u)
            .collect();
        Ok(tables.users_sorted(|u| members.contains(&u.uid)))
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let mut roles: Vec<RoleResponse> = self.lock().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role(&self, rid: Uuid) -> Result<Option<RoleResponse>, AppError> {
        Ok(self.lock().roles.get(&rid).cloned())
    }

    async fn role_taken(
        &self,
        name: &str,
        rights: &Rights,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .roles
            .values()
            .any(|r| r.name == name && r.rights == *rights && Some(r.rid) != except))
    }

    async fn insert_role(&self, role: RoleResponse) -> Result<RoleResponse, AppError> {
        self.lock().roles.insert(role.rid, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role: RoleResponse) -> Result<Option<RoleResponse>, AppError> {
        Ok(self.lock().roles.get_mut(&role.rid).map(|stored| {
            *stored = role.clone();
            role
        }))
    }

    async fn delete_role(&self, rid: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if !tables.roles.contains_key(&rid) {
            return Ok(false);
        }
        for user in tables.users.values_mut() {
            if user.record.role_rid == Some(rid) {
                user.record.role_rid = None;
            }
        }
        tables.roles.remove(&rid);
        Ok(true)
    }

    async fn holders_of_role(&self, rid: Uuid) -> Result<Vec<UserResponse>, AppError> {
        Ok(self.lock().users_sorted(|u| u.role_rid == Some(rid)))
    }
}
