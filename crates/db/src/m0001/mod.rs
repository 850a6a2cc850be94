mod permission;
mod permission_grant;
mod subscription;
mod user;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "lnatprep",
    "m0001",
    vec_box![],
    vec_box![
        user::CreateTable,
        user::CreateUk1,
        user::CreateIdx1,
        subscription::CreateTable,
        subscription::CreateIdx1,
        permission_grant::CreateTable,
        permission_grant::CreateIdx1,
        permission::CreateTable
    ]
);
