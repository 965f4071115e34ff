// Typed reads over the generic record store

use backend_domain::{
    from_row, Collection, Event, EventId, Filter, Group, GroupId, GroupMembership, InviteCode,
    JoinRecord, LedgerEntry, RecordStore, StoreError, UserId,
};

pub struct Records<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Records<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub async fn event(&self, event_id: &EventId) -> Result<Option<Event>, StoreError> {
        self.one(Collection::Events, Filter::new().eq("id", event_id.as_str()))
            .await
    }

    pub async fn join(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<JoinRecord>, StoreError> {
        self.one(Collection::Joins, join_filter(user_id, event_id)).await
    }

    pub async fn joins_for_event(&self, event_id: &EventId) -> Result<Vec<JoinRecord>, StoreError> {
        let mut joins: Vec<JoinRecord> = self
            .many(Collection::Joins, Filter::new().eq("event_id", event_id.as_str()))
            .await?;
        joins.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(joins)
    }

    pub async fn joins_for_user(&self, user_id: &UserId) -> Result<Vec<JoinRecord>, StoreError> {
        self.many(Collection::Joins, Filter::new().eq("user_id", user_id.as_str()))
            .await
    }

    pub async fn ledger_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, StoreError> {
        self.many(
            Collection::PointsLedger,
            Filter::new().eq("user_id", user_id.as_str()),
        )
        .await
    }

    pub async fn group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError> {
        self.one(Collection::Groups, Filter::new().eq("id", group_id.as_str()))
            .await
    }

    pub async fn group_by_invite(&self, code: &InviteCode) -> Result<Option<Group>, StoreError> {
        self.one(
            Collection::Groups,
            Filter::new().eq("invite_code", code.as_str()),
        )
        .await
    }

    pub async fn membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMembership>, StoreError> {
        self.one(Collection::GroupMembers, membership_filter(group_id, user_id))
            .await
    }

    /// Members ordered by `joined_at`, then user id.
    pub async fn members(&self, group_id: &GroupId) -> Result<Vec<GroupMembership>, StoreError> {
        let mut members: Vec<GroupMembership> = self
            .many(
                Collection::GroupMembers,
                Filter::new().eq("group_id", group_id.as_str()),
            )
            .await?;
        members.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(members)
    }

    async fn one<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<T>, StoreError> {
        self.store
            .select_one(collection, &filter)
            .await?
            .map(|row| from_row(collection, row))
            .transpose()
    }

    async fn many<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Vec<T>, StoreError> {
        self.store
            .select_many(collection, &filter, None)
            .await?
            .into_iter()
            .map(|row| from_row(collection, row))
            .collect()
    }
}

pub fn join_filter(user_id: &UserId, event_id: &EventId) -> Filter {
    Filter::new()
        .eq("user_id", user_id.as_str())
        .eq("event_id", event_id.as_str())
}

pub fn membership_filter(group_id: &GroupId, user_id: &UserId) -> Filter {
    Filter::new()
        .eq("group_id", group_id.as_str())
        .eq("user_id", user_id.as_str())
}
