//! 用户实体
//!
//! 用户记录一旦创建永不删除，仅在连接/断开时做在线状态切换。
//! 同一规范化用户名在任意时刻至多对应一个在线用户。

use serde::{Deserialize, Serialize};

/// 用户唯一标识
///
/// id 空间视为无界随机分配，创建时需校验不与现有用户冲突。
pub type UserId = i64;

/// 用户在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Online,
    Offline,
}

/// 用户实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
    pub status: UserStatus,
}

impl User {
    /// 首次加入时创建用户，初始即为在线
    pub fn new_online(id: UserId, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: avatar.into(),
            status: UserStatus::Online,
        }
    }

    /// 用户名规范化：用于唯一性比较，显示名保留原始大小写
    pub fn normalize_name(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// 当前用户的规范化用户名
    pub fn normalized_name(&self) -> String {
        Self::normalize_name(&self.name)
    }

    pub fn is_online(&self) -> bool {
        self.status == UserStatus::Online
    }

    /// 上线，重复调用幂等
    pub fn go_online(&mut self) {
        self.status = UserStatus::Online;
    }

    /// 下线
    pub fn go_offline(&mut self) {
        self.status = UserStatus::Offline;
    }

    /// 离线用户以同名重新加入：恢复在线并刷新显示名与头像
    pub fn reactivate(&mut self, name: impl Into<String>, avatar: impl Into<String>) {
        self.name = name.into();
        self.avatar = avatar.into();
        self.status = UserStatus::Online;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_trims_and_case_folds() {
        assert_eq!(User::normalize_name("  Alice "), "alice");
        assert_eq!(User::normalize_name("ALICE"), "alice");
    }

    #[test]
    fn reactivate_refreshes_profile_and_goes_online() {
        let mut user = User::new_online(7, "Alice", "a.png");
        user.go_offline();
        assert!(!user.is_online());

        user.reactivate("alice", "b.png");
        assert!(user.is_online());
        assert_eq!(user.name, "alice");
        assert_eq!(user.avatar, "b.png");
        assert_eq!(user.id, 7);
    }

    #[test]
    fn status_serializes_in_wire_casing() {
        let json = serde_json::to_string(&UserStatus::Online).unwrap();
        assert_eq!(json, "\"ONLINE\"");
    }
}
