use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum User {
    Table,
    Id,
    Email,
    Role,
    State,
    TrialEndsAt,
    Subscription,
    Permissions,
    PermissionStatus,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum Subscription {
    Table,
    Id,
    UserId,
    Status,
    Data,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum PermissionGrant {
    Table,
    Id,
    UserId,
    PermissionId,
    GrantedBy,
    GrantedAt,
    ExpiresAt,
    Active,
    RevokedAt,
    RevokedBy,
    RevokeReason,
}

#[derive(Iden, Clone)]
pub enum Permission {
    Table,
    Id,
    Name,
    Description,
}
