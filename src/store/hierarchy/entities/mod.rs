/// Role entity module
pub mod role;
/// Role inheritance edge entity module
pub mod role_inherit;
/// User role assignment entity module
pub mod user_role;

pub use role::Entity as Role;
pub use role_inherit::Entity as RoleInherit;
pub use user_role::Entity as UserRole;
