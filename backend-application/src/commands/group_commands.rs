use serde_json::json;
use tracing::{error, info, warn};

use backend_domain::{
    from_row, to_row, Collection, Filter, Group, GroupId, GroupMembership, GroupRole, GroupUpdate,
    IdentityProvider, InviteCode, NewGroup, Row, UserId,
};

use crate::commands::{caller, normalize_optional_text};
use crate::records::membership_filter;
use crate::{AppError, AppState, ConflictKind, NotFoundKind};

const INVITE_CODE_ATTEMPTS: usize = 5;
const MAX_NAME_LEN: usize = 80;

/// Creates the group and the creator's admin membership. A failed
/// membership insert removes the group again.
pub async fn create_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: NewGroup,
) -> Result<Group, AppError> {
    state.observe("create_group", try_create_group(state, identity, payload).await)
}

pub async fn join_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    invite_code: &str,
) -> Result<GroupMembership, AppError> {
    state.observe("join_group", try_join_group(state, identity, invite_code).await)
}

pub async fn remove_member(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
    target: &UserId,
) -> Result<(), AppError> {
    state.observe(
        "remove_member",
        try_remove_member(state, identity, group_id, target).await,
    )
}

pub async fn update_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
    update: GroupUpdate,
) -> Result<Group, AppError> {
    state.observe(
        "update_group",
        try_update_group(state, identity, group_id, update).await,
    )
}

pub async fn leave_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
) -> Result<(), AppError> {
    state.observe("leave_group", try_leave_group(state, identity, group_id).await)
}

async fn try_create_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: NewGroup,
) -> Result<Group, AppError> {
    let creator = caller(identity)?;
    let name = validate_name(&payload.name)?;
    let monthly_goal = validate_goal(payload.monthly_goal)?;
    let now = state.now();

    let mut group = Group {
        id: GroupId::generate(),
        name,
        description: payload.description.trim().to_string(),
        monthly_goal,
        invite_code: InviteCode::generate(),
        created_by: creator.clone(),
        created_at: now,
    };
    let mut attempt = 1;
    loop {
        match state
            .store
            .insert(Collection::Groups, to_row(Collection::Groups, &group)?)
            .await
        {
            Ok(_) => break,
            Err(err) if err.is_unique_violation() && attempt < INVITE_CODE_ATTEMPTS => {
                warn!(attempt, "invite code collision, regenerating");
                group.invite_code = InviteCode::generate();
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let membership = GroupMembership {
        group_id: group.id.clone(),
        user_id: creator,
        role: GroupRole::Admin,
        joined_at: now,
    };
    let inserted = match to_row(Collection::GroupMembers, &membership) {
        Ok(row) => state.store.insert(Collection::GroupMembers, row).await,
        Err(err) => Err(err),
    };
    if let Err(err) = inserted {
        let orphan = Filter::new().eq("id", group.id.as_str());
        if let Err(rollback) = state.store.delete(Collection::Groups, &orphan).await {
            error!(group_id = %group.id, "failed to roll back group without admin: {}", rollback);
        }
        return Err(err.into());
    }

    info!(group_id = %group.id, created_by = %group.created_by, "group created");
    Ok(group)
}

async fn try_join_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    invite_code: &str,
) -> Result<GroupMembership, AppError> {
    let user_id = caller(identity)?;
    let code = InviteCode::parse(invite_code).ok_or(NotFoundKind::InvalidInviteCode)?;
    let records = state.records();
    let group = records
        .group_by_invite(&code)
        .await?
        .ok_or(NotFoundKind::InvalidInviteCode)?;
    if records.membership(&group.id, &user_id).await?.is_some() {
        return Err(ConflictKind::AlreadyMember.into());
    }

    let membership = GroupMembership {
        group_id: group.id,
        user_id,
        role: GroupRole::Member,
        joined_at: state.now(),
    };
    match state
        .store
        .insert(
            Collection::GroupMembers,
            to_row(Collection::GroupMembers, &membership)?,
        )
        .await
    {
        Ok(_) => {}
        Err(err) if err.is_unique_violation() => return Err(ConflictKind::AlreadyMember.into()),
        Err(err) => return Err(err.into()),
    }
    info!(group_id = %membership.group_id, user_id = %membership.user_id, "joined group");
    Ok(membership)
}

async fn try_remove_member(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
    target: &UserId,
) -> Result<(), AppError> {
    let acting = caller(identity)?;
    require_admin(state, group_id, &acting).await?;
    let records = state.records();
    let members = records.members(group_id).await?;
    let membership = members
        .iter()
        .find(|member| &member.user_id == target)
        .ok_or(NotFoundKind::NotAMember)?;
    ensure_admin_remains(&members, membership)?;

    state
        .store
        .delete(Collection::GroupMembers, &membership_filter(group_id, target))
        .await?;
    info!(group_id = %group_id, user_id = %target, removed_by = %acting, "member removed");
    Ok(())
}

async fn try_update_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
    update: GroupUpdate,
) -> Result<Group, AppError> {
    let acting = caller(identity)?;
    require_admin(state, group_id, &acting).await?;

    let mut patch = Row::new();
    if let Some(name) = update.name {
        patch.insert("name".to_string(), json!(validate_name(&name)?));
    }
    if let Some(description) = update.description {
        patch.insert(
            "description".to_string(),
            json!(normalize_optional_text(Some(description)).unwrap_or_default()),
        );
    }
    if let Some(goal) = update.monthly_goal {
        patch.insert("monthly_goal".to_string(), json!(validate_goal(goal)?));
    }
    if patch.is_empty() {
        return Err(AppError::Validation("nothing to update".to_string()));
    }

    let filter = Filter::new().eq("id", group_id.as_str());
    let row = state
        .store
        .update(Collection::Groups, &filter, patch)
        .await?
        .ok_or(NotFoundKind::Group)?;
    let group: Group = from_row(Collection::Groups, row)?;
    info!(group_id = %group.id, updated_by = %acting, "group updated");
    Ok(group)
}

async fn try_leave_group(
    state: &AppState,
    identity: &dyn IdentityProvider,
    group_id: &GroupId,
) -> Result<(), AppError> {
    let user_id = caller(identity)?;
    let members = state.records().members(group_id).await?;
    let membership = members
        .iter()
        .find(|member| member.user_id == user_id)
        .ok_or(NotFoundKind::NotAMember)?;
    ensure_admin_remains(&members, membership)?;

    state
        .store
        .delete(Collection::GroupMembers, &membership_filter(group_id, &user_id))
        .await?;
    info!(group_id = %group_id, user_id = %user_id, "left group");
    Ok(())
}

async fn require_admin(
    state: &AppState,
    group_id: &GroupId,
    user_id: &UserId,
) -> Result<(), AppError> {
    let records = state.records();
    if records.group(group_id).await?.is_none() {
        return Err(NotFoundKind::Group.into());
    }
    match records.membership(group_id, user_id).await? {
        Some(membership) if membership.is_admin() => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// The last admin can only go once nobody else is left.
fn ensure_admin_remains(
    members: &[GroupMembership],
    leaving: &GroupMembership,
) -> Result<(), AppError> {
    if !leaving.is_admin() {
        return Ok(());
    }
    let admins = members.iter().filter(|member| member.is_admin()).count();
    if admins <= 1 && members.len() > 1 {
        return Err(ConflictKind::LastAdmin.into());
    }
    Ok(())
}

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn validate_goal(goal: i64) -> Result<u32, AppError> {
    if goal <= 0 {
        return Err(AppError::Validation(
            "monthly_goal must be greater than 0".to_string(),
        ));
    }
    u32::try_from(goal).map_err(|_| AppError::Validation("monthly_goal is too large".to_string()))
}
