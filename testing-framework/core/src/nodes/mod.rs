mod api_client;
pub mod payment;

pub use api_client::{RpcClient, RpcError};
pub use payment::{PaymentClientError, PaymentContractClient, PaymentContractConfig};
