mod balance;
mod currency;
mod exchange;
mod history;
mod ledger;
mod money;
mod transaction;
mod user;

pub use balance::*;
pub use currency::*;
pub use exchange::*;
pub use history::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;
pub use user::*;
