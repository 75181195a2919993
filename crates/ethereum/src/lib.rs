pub mod balance;
pub mod keypair;
pub mod rpc;

pub use keypair::{Identity, IdentityError, load_identity, persist_identity};

pub use balance::{ETHER_DECIMALS, ether, wei_to_ether};

pub use rpc::AlloyRpcClient;
