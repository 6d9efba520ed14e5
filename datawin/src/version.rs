// SPDX-FileCopyrightText: 2025 Chiel Douwes
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

const LAYERS_MIN_MAJOR: u32 = 2;
const DEFAULT_PRE_CREATE_CODE_MIN_BYTECODE: u32 = 16;

fn default_pre_create_code_min_bytecode() -> u32 {
	DEFAULT_PRE_CREATE_CODE_MIN_BYTECODE
}

/// Format versions negotiated by the container's general info chunk.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VersionContext {
	pub major: u32,
	pub bytecode: u32,
	/// Lowest bytecode version whose room instances carry a pre-create code reference.
	///
	/// GM:S 1.4.9999 has the field as well, so the bytecode version is only the closest known
	/// marker for it.
	#[serde(default = "default_pre_create_code_min_bytecode")]
	pub pre_create_code_min_bytecode: u32,
}

impl VersionContext {
	pub fn new(major: u32, bytecode: u32) -> Self {
		Self {
			major,
			bytecode,
			pre_create_code_min_bytecode: DEFAULT_PRE_CREATE_CODE_MIN_BYTECODE,
		}
	}

	pub fn with_pre_create_code_min_bytecode(self, threshold: u32) -> Self {
		Self {
			pre_create_code_min_bytecode: threshold,
			..self
		}
	}

	pub fn major_version(&self) -> u32 {
		self.major
	}

	pub fn bytecode_version(&self) -> u32 {
		self.bytecode
	}

	pub fn has_layers(&self) -> bool {
		self.major >= LAYERS_MIN_MAJOR
	}

	pub fn has_pre_create_code(&self) -> bool {
		self.bytecode >= self.pre_create_code_min_bytecode
	}
}

impl Default for VersionContext {
	fn default() -> Self {
		Self::new(1, DEFAULT_PRE_CREATE_CODE_MIN_BYTECODE)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gates() {
		let gms1 = VersionContext::new(1, 15);
		assert!(!gms1.has_layers());
		assert!(!gms1.has_pre_create_code());

		let gms2 = VersionContext::new(2, 17);
		assert!(gms2.has_layers());
		assert!(gms2.has_pre_create_code());

		assert!(!gms2.with_pre_create_code_min_bytecode(18).has_pre_create_code());
	}

	#[test]
	fn threshold_defaults_when_missing_from_settings() {
		let version: VersionContext =
			serde_json::from_str(r#"{ "major": 2, "bytecode": 16 }"#).unwrap();
		assert_eq!(version, VersionContext::new(2, 16));

		let version: VersionContext = serde_json::from_str(
			r#"{ "major": 1, "bytecode": 15, "pre_create_code_min_bytecode": 14 }"#,
		)
		.unwrap();
		assert!(version.has_pre_create_code());
	}
}
