pub type GuildId = u64;
pub type ChannelId = u64;
pub type UserId = u64;
