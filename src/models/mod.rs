pub mod chat;
pub mod message;
pub mod notification;
pub mod payment;
pub mod statistics;
pub mod user;

pub use chat::Conversation;
pub use message::{Message, Reaction};
pub use notification::NotificationItem;
pub use payment::{HostPayment, PaymentTransaction, UpgradeRequest};
pub use statistics::{Badges, DashboardOverview, DashboardStats, PostStats, TopHost};
pub use user::{Role, UserProfile};
