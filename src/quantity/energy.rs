quantity!(WattHours, suffix: "Wh", precision: 1);
quantity!(KilowattHours, suffix: "kWh", precision: 2);

impl From<WattHours> for KilowattHours {
    fn from(watt_hours: WattHours) -> Self {
        Self(watt_hours.0 * 0.001)
    }
}

impl From<KilowattHours> for WattHours {
    fn from(kilowatt_hours: KilowattHours) -> Self {
        Self(kilowatt_hours.0 * 1000.0)
    }
}
