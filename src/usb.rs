//! USB vendor/product discovery through sysfs.
//!
//! `/sys/class/scsi_generic/sgX` is a symlink deep into the USB device tree;
//! the directory six levels above the resolved target is the USB device
//! itself, holding the `idVendor` and `idProduct` attribute files.

use std::fs;
use std::path::Path;

use log::debug;

use crate::device;
use crate::error::{Error, Result};

/// Where the kernel exposes SCSI-generic class devices
pub const SYSFS_SG_BASE_PATH: &str = "/sys/class/scsi_generic";

const VENDOR_FILE: &str = "idVendor";
const PRODUCT_FILE: &str = "idProduct";

// sysfs ID files hold one hex number and a newline.
fn parse_usb_id(contents: &str) -> Option<u16> {
    u16::from_str_radix(contents.trim(), 16).ok()
}

/// Resolve the USB vendor and product IDs for a SCSI-generic device name
/// like `sg1`.
pub fn vendor_product(dev_name: &str) -> Result<(u16, u16)> {
    let class_link = Path::new(SYSFS_SG_BASE_PATH).join(dev_name);

    let device_dir = class_link
        .canonicalize()
        .map_err(|_| Error::SysfsWalkFailed)?;

    // Back out to the directory that contains the idVendor and idProduct
    // files, usually something like
    // /sys/devices/pci0000:00/0000:00:14.0/usb1/1-3
    let usb_dir = device_dir
        .ancestors()
        .nth(6)
        .ok_or(Error::SysfsWalkFailed)?;

    debug!("reading USB IDs from {}", usb_dir.display());

    let vendor = fs::read_to_string(usb_dir.join(VENDOR_FILE))
        .ok()
        .as_deref()
        .and_then(parse_usb_id)
        .ok_or(Error::UsbVendorOpenFailed)?;

    let product = fs::read_to_string(usb_dir.join(PRODUCT_FILE))
        .ok()
        .as_deref()
        .and_then(parse_usb_id)
        .ok_or(Error::UsbProductOpenFailed)?;

    debug!("device vendor {vendor:04x}, product {product:04x}");

    Ok((vendor, product))
}

/// Match a vendor/product pair against the supported-reader table
pub fn find_profile(vendor: u16, product: u16) -> Result<u8> {
    device::profile_for(vendor, product).ok_or(Error::DeviceNotSupported)
}
