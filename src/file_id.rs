//! GSM file identifiers, two-byte big-endian on the wire.
//!
//! Pass these to [`SimReader::select_file`](crate::sim::SimReader::select_file)
//! and friends. The groupings follow GSM 11.11 section 10: files directly
//! under the master file, the telecom directory, and the GSM directory.

/// Master file (root directory)
pub const MF: u16 = 0x3f00;
/// Extended language preference
pub const EF_ELP: u16 = 0x2f05;
/// ICC identification
pub const EF_ICCID: u16 = 0x2fe2;

/// Telecom directory
pub const DF_TELECOM: u16 = 0x7f10;
/// Abbreviated dialling numbers (contacts)
pub const EF_ADN: u16 = 0x6f3a;
/// Fixed dialling numbers
pub const EF_FDN: u16 = 0x6f3b;
/// Short messages
pub const EF_SMS: u16 = 0x6f3c;
/// Capability configuration parameters
pub const EF_CCP: u16 = 0x6f3d;
/// MSISDN (own numbers)
pub const EF_MSISDN: u16 = 0x6f40;
/// SMS parameters
pub const EF_SMSP: u16 = 0x6f42;
/// SMS status
pub const EF_SMSS: u16 = 0x6f43;
/// Last numbers dialled
pub const EF_LND: u16 = 0x6f44;
/// SMS status reports
pub const EF_SMSR: u16 = 0x6f47;
/// Service dialling numbers
pub const EF_SDN: u16 = 0x6f49;
/// Extension 1
pub const EF_EXT1: u16 = 0x6f4a;
/// Extension 2
pub const EF_EXT2: u16 = 0x6f4b;
/// Extension 3
pub const EF_EXT3: u16 = 0x6f4c;
/// Barred dialling numbers
pub const EF_BDN: u16 = 0x6f4d;
/// Extension 4
pub const EF_EXT4: u16 = 0x6f4e;

/// GSM directory
pub const DF_GSM: u16 = 0x7f20;
/// Language preference
pub const EF_LP: u16 = 0x6f05;
/// International mobile subscriber identity
pub const EF_IMSI: u16 = 0x6f07;
/// Ciphering key Kc
pub const EF_KC: u16 = 0x6f20;
/// De-personalization control keys
pub const EF_DCK: u16 = 0x6f2c;
/// PLMN selector
pub const EF_PLMNSEL: u16 = 0x6f30;
/// Higher priority PLMN search period
pub const EF_HPLMN: u16 = 0x6f31;
/// Co-operative network list
pub const EF_CNL: u16 = 0x6f32;
/// Accumulated call meter maximum
pub const EF_ACMMAX: u16 = 0x6f37;
/// SIM service table
pub const EF_SST: u16 = 0x6f38;
/// Accumulated call meter
pub const EF_ACM: u16 = 0x6f39;
/// Group identifier level 1
pub const EF_GID1: u16 = 0x6f3e;
/// Group identifier level 2
pub const EF_GID2: u16 = 0x6f3f;
/// Price per unit and currency table
pub const EF_PUCT: u16 = 0x6f41;
/// Cell broadcast message identifiers
pub const EF_CBMI: u16 = 0x6f45;
/// Service provider name
pub const EF_SPN: u16 = 0x6f46;
/// Cell broadcast message identifiers for data download
pub const EF_CBMID: u16 = 0x6f48;
/// Cell broadcast message identifier ranges
pub const EF_CBMIR: u16 = 0x6f50;
/// Network's indication of alerting
pub const EF_NIA: u16 = 0x6f51;
/// GPRS ciphering key
pub const EF_KCGPRS: u16 = 0x6f52;
/// GPRS location information
pub const EF_LOCIGPRS: u16 = 0x6f53;
/// Broadcast control channels
pub const EF_BCCH: u16 = 0x6f74;
/// Access control class
pub const EF_ACC: u16 = 0x6f78;
/// Forbidden PLMNs
pub const EF_FPLMN: u16 = 0x6f7b;
/// Location information
pub const EF_LOCI: u16 = 0x6f7e;
/// Administrative data
pub const EF_AD: u16 = 0x6fad;
/// Phase identification
pub const EF_PHASE: u16 = 0x6fae;
/// Voice group call service
pub const EF_VGCS: u16 = 0x6fb1;
/// Voice group call service status
pub const EF_VGCSS: u16 = 0x6fb2;
/// Voice broadcast service
pub const EF_VBS: u16 = 0x6fb3;
/// Voice broadcast service status
pub const EF_VBSS: u16 = 0x6fb4;
/// Enhanced multi-level pre-emption and priority
pub const EF_EMLPP: u16 = 0x6fb5;
/// Automatic answer for eMLPP service
pub const EF_AAEM: u16 = 0x6fb6;
/// Emergency call codes
pub const EF_ECC: u16 = 0x6fb7;
