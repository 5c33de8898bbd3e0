//! Well-known on-chain addresses for Jupiter vote-escrow staking

/// Jupiter locked-voter (staking) program
pub const JUPITER_STAKING_PROGRAM: &str = "voTpe3tHQ7AjQHMapgSue2HJFAh2cGsdokqN3XqmVSj";

/// Merkle distributor used by claim-and-stake flows
pub const CLAIM_STAKE_PROGRAM: &str = "DiS3nNjFVMieMgmiQFm6wgJL7nevk4NrhXKLbtEH1Z2R";

/// JUP token mint
pub const JUP_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

/// Automation wallet that stakes and withdraws on behalf of users
pub const CRANK_WALLET: &str = "crankz76bWa5KE4k8G4AfRg5NfNSj9baLxyVgikxr9r";
